use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::models::Transaction;
use crate::storage::Storage;
use crate::types::TransactionKey;

pub struct TransactionStore {
    transactions: RwLock<Arc<Vec<Transaction>>>,
    next_key: AtomicU64
}

impl TransactionStore {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Arc::new(Vec::new())),
            next_key: AtomicU64::new(1)
        }
    }

    fn allocate_key(&self) -> TransactionKey {
        self.next_key.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for TransactionStore {
    fn snapshot(&self) -> Arc<Vec<Transaction>> {
        //NOTE: Writers only swap the Arc, so a poisoned lock still guards a consistent list
        self.transactions.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Ingests a freshly fetched list, assigning each transaction a key unique to this store.
    fn replace(&self, mut transactions: Vec<Transaction>) -> usize {
        for transaction in &mut transactions {
            transaction.key = self.allocate_key();
        }

        let count = transactions.len();
        *self.transactions.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(transactions);

        debug!("Transaction store replaced with {count} transactions");

        count
    }
}
