//! Callbacks bound to a tree at construction time.

use std::cmp::Ordering;
use std::fmt::{self, Display};
use std::marker::PhantomData;

use bytemuck::Pod;

/// A total order over two records of the tree's record size.
pub trait Comparator {
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> Ordering;
}

impl<F> Comparator for F
where
    F: Fn(&[u8], &[u8]) -> Ordering,
{
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> Ordering {
        self(lhs, rhs)
    }
}

/// Releases resources owned by a record before its storage is freed.
///
/// Called exactly once per record leaving the tree, either on removal or on teardown.
pub trait Destructor {
    fn destroy(&mut self, record: &mut [u8]);
}

impl<F> Destructor for F
where
    F: FnMut(&mut [u8]),
{
    fn destroy(&mut self, record: &mut [u8]) {
        self(record)
    }
}

/// Destructor for records that own nothing beyond their bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoDestructor;

impl Destructor for NoDestructor {
    fn destroy(&mut self, _record: &mut [u8]) {}
}

/// Renders a record for `AvlTree::print`.
pub trait Printer {
    fn render(&self, record: &[u8]) -> String;
}

impl<F> Printer for F
where
    F: Fn(&[u8]) -> String,
{
    fn render(&self, record: &[u8]) -> String {
        self(record)
    }
}

/// Orders records by decoding them as `T` and comparing with `T: Ord`.
pub struct PodOrder<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> PodOrder<T> {
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for PodOrder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for PodOrder<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PodOrder<T> {}

impl<T> fmt::Debug for PodOrder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PodOrder")
    }
}

impl<T: Pod + Ord> Comparator for PodOrder<T> {
    fn compare(&self, lhs: &[u8], rhs: &[u8]) -> Ordering {
        // Record storage is byte-aligned, so decode by copy.
        let lhs: T = bytemuck::pod_read_unaligned(lhs);
        let rhs: T = bytemuck::pod_read_unaligned(rhs);
        lhs.cmp(&rhs)
    }
}

/// Prints records decoded as `T` in parentheses, e.g. `(42)`.
pub struct PodPrinter<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> PodPrinter<T> {
    pub const fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for PodPrinter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pod + Display> Printer for PodPrinter<T> {
    fn render(&self, record: &[u8]) -> String {
        let value: T = bytemuck::pod_read_unaligned(record);
        format!("({value})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pod_order() {
        let order = PodOrder::<i32>::new();
        let a = bytemuck::bytes_of(&-5i32);
        let b = bytemuck::bytes_of(&7i32);
        assert_eq!(order.compare(a, b), Ordering::Less);
        assert_eq!(order.compare(b, a), Ordering::Greater);
        assert_eq!(order.compare(a, a), Ordering::Equal);
    }

    #[test]
    fn test_pod_printer() {
        let printer = PodPrinter::<u64>::new();
        assert_eq!(printer.render(bytemuck::bytes_of(&42u64)), "(42)");
    }

    #[test]
    fn test_closure_policies() {
        let by_first_byte = |lhs: &[u8], rhs: &[u8]| lhs[0].cmp(&rhs[0]);
        assert_eq!(by_first_byte.compare(&[1, 9], &[2, 0]), Ordering::Less);

        let mut destroyed = 0;
        let mut destructor = |record: &mut [u8]| {
            record.fill(0);
            destroyed += 1;
        };
        let mut record = [3u8, 4];
        Destructor::destroy(&mut destructor, &mut record);
        assert_eq!(record, [0, 0]);
        assert_eq!(destroyed, 1);
    }
}
