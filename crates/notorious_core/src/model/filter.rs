//! Pagination filters passed to repository queries.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SKIP: u64 = 0;
pub const DEFAULT_TAKE: u64 = 10;

/// Page window shared by every repository filter type.
pub trait PageFilter {
    fn skip(&self) -> u64;
    fn take(&self) -> u64;
}

/// Plain page window. `take` must be positive when used in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub skip: u64,
    pub take: u64,
}

impl Filter {
    pub fn new(skip: u64, take: u64) -> Self {
        Self { skip, take }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            skip: DEFAULT_SKIP,
            take: DEFAULT_TAKE,
        }
    }
}

impl PageFilter for Filter {
    fn skip(&self) -> u64 {
        self.skip
    }

    fn take(&self) -> u64 {
        self.take
    }
}
