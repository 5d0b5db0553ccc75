pub mod test_zero_capacity_config;
