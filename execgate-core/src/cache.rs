//! Bounded cache for allowlist evaluations.
//!
//! The key holds every input that can change a decision, so a hit is always
//! the answer a fresh evaluation would give for the same inputs. Executable
//! resolution reads the filesystem, so hosts that install binaries while
//! running should [`DecisionCache::clear`] afterwards.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use parking_lot::Mutex;

use crate::allowlist::ExecAllowlistEntry;
use crate::evaluator::{AllowlistEvaluationParams, ExecAllowlistAnalysis, SkillBinSet};
use crate::platform::Platform;
use crate::resolver::CommandEnv;
use crate::safe_bins::SafeBinSet;
use crate::trust::TrustedSafeBinDirs;

pub const DEFAULT_DECISION_CACHE_SIZE: usize = 1000;

/// Every input of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EvaluationKey {
    command: String,
    cwd: Option<PathBuf>,
    env: Option<CommandEnv>,
    platform: Platform,
    allowlist: Vec<ExecAllowlistEntry>,
    safe_bins: SafeBinSet,
    trusted_dirs: TrustedSafeBinDirs,
    skill_bins: SkillBinSet,
    auto_allow_skills: bool,
}

impl EvaluationKey {
    pub fn new(
        command: &str,
        env: Option<&CommandEnv>,
        params: &AllowlistEvaluationParams<'_>,
    ) -> Self {
        Self {
            command: command.to_string(),
            cwd: params.cwd.map(Path::to_path_buf),
            env: env.cloned(),
            platform: params.platform.clone(),
            allowlist: params.allowlist.to_vec(),
            safe_bins: params.safe_bins.clone(),
            trusted_dirs: params.trusted_dirs.clone(),
            skill_bins: params.skill_bins.clone(),
            auto_allow_skills: params.auto_allow_skills,
        }
    }
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entry_count: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Thread-safe LRU of evaluation results.
pub struct DecisionCache {
    entries: Mutex<LruCache<EvaluationKey, ExecAllowlistAnalysis>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DecisionCache {
    /// A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &EvaluationKey) -> Option<ExecAllowlistAnalysis> {
        let cached = self.entries.lock().get(key).cloned();
        let counter = if cached.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        cached
    }

    pub fn insert(&self, key: EvaluationKey, analysis: ExecAllowlistAnalysis) {
        self.entries.lock().put(key, analysis);
    }

    /// Cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<F>(&self, key: EvaluationKey, evaluate: F) -> ExecAllowlistAnalysis
    where
        F: FnOnce() -> ExecAllowlistAnalysis,
    {
        if let Some(cached) = self.get(&key) {
            return cached;
        }
        let analysis = evaluate();
        self.insert(key, analysis.clone());
        analysis
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            entry_count: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new(DEFAULT_DECISION_CACHE_SIZE)
    }
}

impl std::fmt::Debug for DecisionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionCache")
            .field("stats", &self.stats())
            .finish()
    }
}
