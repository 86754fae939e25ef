use std::future::Future;

use crate::Result;
use crate::types::{Released, UserData, UserRecord};

/// Durable store of user records.
///
/// Expected failures are returned as `Err`; a panic is treated as a defect.
pub trait RecordStore {
    /// # Errors
    ///
    /// Returns an error if the store rejects the user.
    fn create_record(&self, user: &UserData) -> impl Future<Output = Result<UserRecord>>;

    /// # Errors
    ///
    /// Returns an error if the record does not exist or cannot be deleted.
    fn delete_record(&self, user_id: &str) -> impl Future<Output = Result<Released>>;
}
