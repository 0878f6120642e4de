//! Entries as read back from stored trees

pub mod database_entry;
