//! Multi-key record ordering

use crate::config::SortPolicy;
use crate::error::{RosterError, RosterResult};
use crate::locale::compare_names;
use crate::record::Record;
use rayon::prelude::*;
use std::cmp::Ordering;

/// Record count at which sorting switches to the parallel stable sort
pub const PARALLEL_THRESHOLD: usize = 8192;

/// Total order over records for one sort policy
#[derive(Debug, Clone, Copy)]
pub struct RecordComparator {
    policy: SortPolicy,
}

impl RecordComparator {
    pub fn new(policy: SortPolicy) -> Self {
        Self { policy }
    }

    #[inline]
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let first = || compare_names(&a.first_name, &b.first_name);
        let last = || compare_names(&a.last_name, &b.last_name);
        // validated dobs are fixed-width ISO dates, so byte order is chronological
        let dob = || a.dob.cmp(&b.dob);
        let ssn = || a.ssn.cmp(&b.ssn);

        let ordering = match self.policy {
            SortPolicy::FirstLast => first().then_with(last).then_with(dob).then_with(ssn),
            SortPolicy::LastFirst => last().then_with(first).then_with(dob).then_with(ssn),
            // the trailing dob comparison repeats the primary key; output depends on it
            SortPolicy::Dob => dob()
                .then_with(last)
                .then_with(first)
                .then_with(dob)
                .then_with(ssn),
        };

        // keys exhausted: distinct names (possible under name|dob|ssn) still need an order
        ordering.then_with(|| a.name.cmp(&b.name))
    }
}

/// Sort records in place with a stable sort.
///
/// Large inputs use rayon's parallel stable sort, inside a dedicated pool when
/// a thread count is given.
pub fn sort_records(
    records: &mut [Record],
    policy: SortPolicy,
    threads: Option<usize>,
) -> RosterResult<()> {
    let comparator = RecordComparator::new(policy);

    if records.len() < PARALLEL_THRESHOLD || num_cpus::get() <= 1 {
        records.sort_by(|a, b| comparator.compare(a, b));
        return Ok(());
    }

    match threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| RosterError::thread_pool_error(&e.to_string()))?;
            pool.install(|| records.par_sort_by(|a, b| comparator.compare(a, b)));
        }
        None => records.par_sort_by(|a, b| comparator.compare(a, b)),
    }

    Ok(())
}

/// Index of the first record that is out of order, if any
pub fn first_disorder(records: &[Record], policy: SortPolicy) -> Option<usize> {
    let comparator = RecordComparator::new(policy);
    records
        .windows(2)
        .position(|pair| comparator.compare(&pair[0], &pair[1]) == Ordering::Greater)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;

    fn record(name: &str, dob: &str, ssn: &str) -> Record {
        let year = dob[..4].parse().expect("test dob year");
        Record::new(name.to_string(), dob.to_string(), ssn.to_string(), year)
    }

    fn names(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_first_last_breaks_ties_on_last_name() {
        let mut records = vec![
            record("Alice Smith", "1980-01-01", "111-11-1111"),
            record("Alice Jones", "1990-01-01", "222-22-2222"),
        ];
        sort_records(&mut records, SortPolicy::FirstLast, None).expect("sort");
        assert_eq!(names(&records), vec!["Alice Jones", "Alice Smith"]);
    }

    #[test]
    fn test_last_first() {
        let mut records = vec![
            record("Zed Adams", "1980-01-01", "111-11-1111"),
            record("Amy Young", "1980-01-01", "222-22-2222"),
            record("Bob Adams", "1980-01-01", "333-33-3333"),
        ];
        sort_records(&mut records, SortPolicy::LastFirst, None).expect("sort");
        assert_eq!(names(&records), vec!["Bob Adams", "Zed Adams", "Amy Young"]);
    }

    #[test]
    fn test_dob_policy() {
        let mut records = vec![
            record("Amy Young", "1985-03-01", "111-11-1111"),
            record("Bob Adams", "1960-12-31", "222-22-2222"),
            record("Cat Adams", "1985-03-01", "333-33-3333"),
        ];
        sort_records(&mut records, SortPolicy::Dob, None).expect("sort");
        assert_eq!(names(&records), vec!["Bob Adams", "Cat Adams", "Amy Young"]);
    }

    #[test]
    fn test_dob_then_ssn_tiebreak() {
        let a = record("Ann Lee", "1970-01-01", "999-99-9999");
        let b = record("Ann Lee", "1970-01-01", "111-11-1111");
        let cmp = RecordComparator::new(SortPolicy::FirstLast);
        assert_eq!(cmp.compare(&a, &b), Ordering::Greater);
        assert_eq!(cmp.compare(&b, &a), Ordering::Less);
    }

    #[test]
    fn test_middle_names_still_ordered() {
        let a = record("Ann B Lee", "1970-01-01", "111-11-1111");
        let b = record("Ann A Lee", "1970-01-01", "111-11-1111");
        let cmp = RecordComparator::new(SortPolicy::FirstLast);
        assert_eq!(cmp.compare(&a, &b), Ordering::Greater);
        assert_eq!(cmp.compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn test_first_disorder() {
        let records = vec![
            record("Bob Adams", "1980-01-01", "111-11-1111"),
            record("Amy Adams", "1980-01-01", "222-22-2222"),
        ];
        assert_eq!(first_disorder(&records, SortPolicy::FirstLast), Some(1));
        assert_eq!(first_disorder(&records[..1], SortPolicy::FirstLast), None);
    }

    #[test]
    fn test_parallel_sort_matches_sequential() {
        let firsts = ["Ann", "Bob", "Cy", "Dee", "Eve", "alice"];
        let lasts = ["Young", "Adams", "Lee", "Ray", "diaz"];
        let mut records: Vec<Record> = (0..PARALLEL_THRESHOLD + 1000)
            .map(|i| {
                let name = format!("{} {}", firsts[i % firsts.len()], lasts[i % lasts.len()]);
                let dob = format!("19{:02}-{:02}-{:02}", 40 + i % 60, 1 + i % 12, 1 + i % 28);
                let ssn = format!("{:03}-{:02}-{:04}", i / 10_000, (i / 100) % 100, i % 10_000);
                record(&name, &dob, &ssn)
            })
            .collect();

        let mut rng = StdRng::seed_from_u64(42);
        records.shuffle(&mut rng);

        for policy in [SortPolicy::FirstLast, SortPolicy::LastFirst, SortPolicy::Dob] {
            let comparator = RecordComparator::new(policy);
            let mut sequential = records.clone();
            sequential.sort_by(|a, b| comparator.compare(a, b));

            let mut pooled = records.clone();
            sort_records(&mut pooled, policy, Some(2)).expect("pooled sort");
            assert_eq!(first_disorder(&pooled, policy), None);
            assert_eq!(pooled, sequential);

            let mut global = records.clone();
            sort_records(&mut global, policy, None).expect("global sort");
            assert_eq!(global, sequential);
        }
    }
}
