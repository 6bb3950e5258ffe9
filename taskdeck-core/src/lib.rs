mod client;
mod events;

pub use client::{
    ApiErrorClass, BoardClient, BoardError, CategoryFields, CategoryRow, TaskFields, TaskRow,
};
pub use events::{CategoryChange, ChangeKind, TaskChange};
