pub mod diary;
pub mod report;
pub mod user;
