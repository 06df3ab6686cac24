mod file_store;
mod total_time_store;

pub use {file_store::FileTotalStore, total_time_store::TotalTimeStore};
