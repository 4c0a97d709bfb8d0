pub mod output;
pub mod row;
pub mod table;
pub mod task;
