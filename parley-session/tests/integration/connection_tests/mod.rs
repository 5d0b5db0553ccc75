pub mod test_answer_call_other_room;
