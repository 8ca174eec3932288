//! Configuration management for roster runs

use crate::error::{RosterError, RosterResult};
use chrono::Datelike;
use std::fmt;
use std::str::FromStr;

/// Default number of lines processed between scheduler yields
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default earliest accepted birth year
pub const DEFAULT_MIN_YEAR: i32 = 1940;

/// Progress is reported after every this many chunks (and on the last one)
pub const DEFAULT_PROGRESS_INTERVAL: usize = 5;

/// How columns are delimited in the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterMode {
    /// Decide once per file by sampling its first lines
    Auto,
    /// Tab separated, fields located by pattern
    Tab,
    /// Pipe separated, fields in fixed `name|dob|ssn` order
    Pipe,
}

/// Ordering applied to the surviving records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortPolicy {
    /// First name, last name, date of birth, SSN
    FirstLast,
    /// Last name, first name, date of birth, SSN
    LastFirst,
    /// Date of birth, last name, first name, SSN
    Dob,
}

/// Which fields make two records duplicates of each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// `ssn|dob`
    SsnDob,
    /// `name|dob|ssn`, the stricter "unique only" mode
    NameDobSsn,
}

/// Field whose change triggers a separator line in the output.
///
/// Configured independently of [`SortPolicy`]; the two are allowed to disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// `first + " " + last`
    FullName,
    LastName,
    Dob,
}

/// Settings snapshot for one run. Never mutated once a run starts.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub delimiter: DelimiterMode,
    pub sort_policy: SortPolicy,
    pub dedup_policy: DedupPolicy,
    pub group_key: GroupKey,
    /// Earliest accepted birth year (inclusive)
    pub min_year: i32,
    /// Latest accepted birth year (inclusive, up to Dec 31)
    pub max_year: i32,
    /// Emit separator lines between groups
    pub include_separators: bool,
    /// Lines per chunk
    pub chunk_size: usize,
    /// Chunks between progress updates
    pub progress_interval: usize,
    /// Output file path (stdout or a derived name when unset)
    pub output_file: Option<String>,
    /// Threads used by the parallel sort
    pub parallel_threads: Option<usize>,
    /// Number of output rows echoed to stderr after the run
    pub preview_rows: usize,
    pub debug: bool,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            delimiter: DelimiterMode::Auto,
            sort_policy: SortPolicy::FirstLast,
            dedup_policy: DedupPolicy::SsnDob,
            group_key: GroupKey::FullName,
            min_year: DEFAULT_MIN_YEAR,
            max_year: current_year(),
            include_separators: false,
            chunk_size: DEFAULT_CHUNK_SIZE,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            output_file: None,
            parallel_threads: None,
            preview_rows: 0,
            debug: false,
        }
    }
}

/// Current calendar year in local time
pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

impl RosterConfig {
    /// Validate configuration for consistency
    pub fn validate(&self) -> RosterResult<()> {
        if self.chunk_size == 0 {
            return Err(RosterError::invalid_option("chunk-size", "0"));
        }

        if self.progress_interval == 0 {
            return Err(RosterError::invalid_option("progress-every", "0"));
        }

        if self.min_year > self.max_year {
            return Err(RosterError::conflicting_options(&format!(
                "min year {} is after max year {}",
                self.min_year, self.max_year
            )));
        }

        if let Some(threads) = self.parallel_threads {
            if threads == 0 {
                return Err(RosterError::thread_pool_error(
                    "thread count must be positive",
                ));
            }
            if threads > 1024 {
                return Err(RosterError::thread_pool_error(
                    "too many threads (maximum 1024)",
                ));
            }
        }

        Ok(())
    }
}

impl FromStr for DelimiterMode {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(DelimiterMode::Auto),
            "tab" | "tsv" => Ok(DelimiterMode::Tab),
            "pipe" | "|" => Ok(DelimiterMode::Pipe),
            _ => Err(RosterError::invalid_option("delimiter", s)),
        }
    }
}

impl fmt::Display for DelimiterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DelimiterMode::Auto => "auto",
            DelimiterMode::Tab => "tab",
            DelimiterMode::Pipe => "pipe",
        };
        write!(f, "{name}")
    }
}

impl FromStr for SortPolicy {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first-last" | "first" | "name" => Ok(SortPolicy::FirstLast),
            "last-first" | "last" => Ok(SortPolicy::LastFirst),
            "dob" | "date" => Ok(SortPolicy::Dob),
            _ => Err(RosterError::invalid_option("sort", s)),
        }
    }
}

impl fmt::Display for SortPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortPolicy::FirstLast => "first-last",
            SortPolicy::LastFirst => "last-first",
            SortPolicy::Dob => "dob",
        };
        write!(f, "{name}")
    }
}

impl FromStr for DedupPolicy {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssn-dob" | "default" => Ok(DedupPolicy::SsnDob),
            "name-dob-ssn" | "unique" | "strict" => Ok(DedupPolicy::NameDobSsn),
            _ => Err(RosterError::invalid_option("dedup", s)),
        }
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DedupPolicy::SsnDob => "ssn-dob",
            DedupPolicy::NameDobSsn => "name-dob-ssn",
        };
        write!(f, "{name}")
    }
}

impl FromStr for GroupKey {
    type Err = RosterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full-name" | "name" => Ok(GroupKey::FullName),
            "last-name" | "last" => Ok(GroupKey::LastName),
            "dob" | "date" => Ok(GroupKey::Dob),
            _ => Err(RosterError::invalid_option("group-by", s)),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupKey::FullName => "full-name",
            GroupKey::LastName => "last-name",
            GroupKey::Dob => "dob",
        };
        write!(f, "{name}")
    }
}

/// Builder pattern for creating configurations
pub struct RosterConfigBuilder {
    config: RosterConfig,
}

impl RosterConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: RosterConfig::default(),
        }
    }

    pub fn delimiter(mut self, delimiter: DelimiterMode) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    pub fn sort_policy(mut self, policy: SortPolicy) -> Self {
        self.config.sort_policy = policy;
        self
    }

    /// Switch to `name|dob|ssn` de-duplication
    pub fn unique_only(mut self) -> Self {
        self.config.dedup_policy = DedupPolicy::NameDobSsn;
        self
    }

    pub fn group_key(mut self, key: GroupKey) -> Self {
        self.config.group_key = key;
        self
    }

    pub fn min_year(mut self, year: i32) -> Self {
        self.config.min_year = year;
        self
    }

    pub fn max_year(mut self, year: i32) -> Self {
        self.config.max_year = year;
        self
    }

    pub fn separators(mut self) -> Self {
        self.config.include_separators = true;
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    pub fn progress_interval(mut self, chunks: usize) -> Self {
        self.config.progress_interval = chunks;
        self
    }

    pub fn output_file(mut self, file: String) -> Self {
        self.config.output_file = Some(file);
        self
    }

    pub fn parallel_threads(mut self, threads: usize) -> Self {
        self.config.parallel_threads = Some(threads);
        self
    }

    pub fn preview_rows(mut self, rows: usize) -> Self {
        self.config.preview_rows = rows;
        self
    }

    pub fn debug(mut self) -> Self {
        self.config.debug = true;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> RosterResult<RosterConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for RosterConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RosterConfig::default();
        assert_eq!(config.delimiter, DelimiterMode::Auto);
        assert_eq!(config.sort_policy, SortPolicy::FirstLast);
        assert_eq!(config.dedup_policy, DedupPolicy::SsnDob);
        assert_eq!(config.group_key, GroupKey::FullName);
        assert_eq!(config.min_year, 1940);
        assert_eq!(config.max_year, current_year());
        assert_eq!(config.chunk_size, 10_000);
        assert!(!config.include_separators);
    }

    #[test]
    fn test_config_builder() {
        let config = RosterConfigBuilder::new()
            .sort_policy(SortPolicy::Dob)
            .unique_only()
            .separators()
            .min_year(1950)
            .max_year(2000)
            .build()
            .expect("Failed to build test config");

        assert_eq!(config.sort_policy, SortPolicy::Dob);
        assert_eq!(config.dedup_policy, DedupPolicy::NameDobSsn);
        assert!(config.include_separators);
        assert_eq!((config.min_year, config.max_year), (1950, 2000));
        // grouping stays on names even though sorting is by date
        assert_eq!(config.group_key, GroupKey::FullName);
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!(
            "last-first".parse::<SortPolicy>().expect("parse sort"),
            SortPolicy::LastFirst
        );
        assert_eq!(
            "PIPE".parse::<DelimiterMode>().expect("parse delimiter"),
            DelimiterMode::Pipe
        );
        assert_eq!(
            "name-dob-ssn".parse::<DedupPolicy>().expect("parse dedup"),
            DedupPolicy::NameDobSsn
        );
        assert!("sideways".parse::<SortPolicy>().is_err());
        assert!("comma".parse::<DelimiterMode>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for key in [GroupKey::FullName, GroupKey::LastName, GroupKey::Dob] {
            assert_eq!(key.to_string().parse::<GroupKey>().expect("parse"), key);
        }
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(RosterConfigBuilder::new().chunk_size(0).build().is_err());
        assert!(RosterConfigBuilder::new()
            .progress_interval(0)
            .build()
            .is_err());
        assert!(RosterConfigBuilder::new()
            .min_year(2000)
            .max_year(1990)
            .build()
            .is_err());

        let config = RosterConfig {
            parallel_threads: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_huge_chunk_size_accepted() {
        let config = RosterConfigBuilder::new()
            .chunk_size(usize::MAX)
            .build()
            .expect("config");
        assert_eq!(config.chunk_size, usize::MAX);
    }
}
