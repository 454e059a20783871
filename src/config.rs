use std::mem;

use crate::error::{TreeError, TreeResult};

/// Construction parameters of a tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeConfig {
    record_size: usize,
}

impl TreeConfig {
    /// Creates a configuration for records of `record_size` bytes.
    /// Fails with `InvalidConfig` if the size is zero.
    pub fn new(record_size: usize) -> TreeResult<Self> {
        if record_size == 0 {
            return Err(TreeError::InvalidConfig("record size must be positive"));
        }
        Ok(Self { record_size })
    }

    /// Creates a configuration whose records are the bytes of a `T`.
    pub fn for_pod<T: bytemuck::Pod>() -> TreeResult<Self> {
        Self::new(mem::size_of::<T>())
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        assert_eq!(TreeConfig::new(4).unwrap().record_size(), 4);
        assert!(matches!(
            TreeConfig::new(0),
            Err(TreeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_for_pod() {
        assert_eq!(TreeConfig::for_pod::<u64>().unwrap().record_size(), 8);
        assert_eq!(TreeConfig::for_pod::<[u16; 3]>().unwrap().record_size(), 6);
        assert!(TreeConfig::for_pod::<()>().is_err());
    }
}
