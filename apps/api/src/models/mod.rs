pub mod candidate;
pub mod job_description;
pub mod score;
