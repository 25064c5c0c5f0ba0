pub mod match_day;
