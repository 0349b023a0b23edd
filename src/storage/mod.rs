mod transaction_store;

use std::sync::Arc;

use crate::models::Transaction;

pub use transaction_store::TransactionStore;

/// Holder of the canonical transaction list for one view session.
///
/// The list is only ever swapped wholesale; readers get an immutable snapshot.
pub trait Storage: Send + Sync + 'static {
    fn snapshot(&self) -> Arc<Vec<Transaction>>;
    fn replace(&self, transactions: Vec<Transaction>) -> usize;

    fn len(&self) -> usize {
        self.snapshot().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self) {
        self.replace(Vec::new());
    }
}
