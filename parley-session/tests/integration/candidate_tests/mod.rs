pub mod test_candidates_queue_until_answer;
pub mod test_local_candidates_published;
