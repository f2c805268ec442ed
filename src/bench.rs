use std::fmt;
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{invalid, KernelResult};
use crate::implementations::Kernel;
use crate::oracle::Equivalent;
use crate::pool::ParallelConfig;

pub fn measure<T>(f: impl FnOnce() -> T) -> (Duration, T) {
    let start = Instant::now();
    let out = f();
    (start.elapsed(), out)
}

/// `sequential / parallel`。並列版の時間が 0 なら 0
pub fn speedup(sequential: Duration, parallel: Duration) -> f64 {
    if parallel.is_zero() {
        return 0.0;
    }
    sequential.as_secs_f64() / parallel.as_secs_f64()
}

/// `speedup / threads`。スレッド数が 0 なら 0
pub fn efficiency(speedup: f64, threads: usize) -> f64 {
    if threads == 0 {
        return 0.0;
    }
    speedup / threads as f64
}

/// 同じ処理を繰り返し測った時間
#[derive(Clone, Debug, Default)]
pub struct Samples {
    times: Vec<Duration>,
}

impl Samples {
    pub fn push(&mut self, time: Duration) {
        self.times.push(time);
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn min(&self) -> Duration {
        self.times.iter().min().copied().unwrap_or_default()
    }

    pub fn max(&self) -> Duration {
        self.times.iter().max().copied().unwrap_or_default()
    }

    pub fn median(&self) -> Duration {
        let mut sorted = self.times.clone();
        sorted.sort();
        sorted.get(sorted.len() / 2).copied().unwrap_or_default()
    }

    pub fn mean(&self) -> Duration {
        if self.times.is_empty() {
            return Duration::ZERO;
        }
        self.times.iter().sum::<Duration>() / self.times.len() as u32
    }
}

impl fmt::Display for Samples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  min:    {:?}", self.min())?;
        writeln!(f, "  median: {:?}", self.median())?;
        writeln!(f, "  mean:   {:?}", self.mean())?;
        write!(f, "  max:    {:?}", self.max())
    }
}

/// `f` を `warmup` 回空回ししてから `samples` 回測定する
///
/// 測定時間と、最後に測定した実行の出力を返す
pub fn sample<T>(
    warmup: usize,
    samples: usize,
    mut f: impl FnMut() -> KernelResult<T>,
) -> KernelResult<(Samples, T)> {
    for _ in 0..warmup {
        f()?;
    }

    let mut timings = Samples::default();
    let mut last = None;
    for _ in 0..samples {
        let (time, out) = measure(&mut f);
        timings.push(time);
        last = Some(out?);
    }
    match last {
        Some(out) => Ok((timings, out)),
        None => invalid("at least one timed sample is required"),
    }
}

#[derive(Clone, Copy, Debug)]
pub struct BenchOptions {
    pub warmup: usize,
    pub samples: usize,
    pub run_sequential: bool,
    pub run_parallel: bool,
    pub tolerance: f64,
}

impl Default for BenchOptions {
    fn default() -> Self {
        BenchOptions {
            warmup: 0,
            samples: 1,
            run_sequential: true,
            run_parallel: true,
            tolerance: 1e-6,
        }
    }
}

/// 1つの問題に対する逐次版と並列版の測定結果
#[derive(Clone, Debug)]
pub struct Comparison {
    pub kernel: &'static str,
    pub size: usize,
    pub threads: usize,
    pub sequential: Option<Samples>,
    pub parallel: Option<Samples>,
    /// オラクルの判定（両方の版を実行したときのみ）
    pub equal: Option<bool>,
}

impl Comparison {
    pub fn speedup(&self) -> Option<f64> {
        match (&self.sequential, &self.parallel) {
            (Some(s), Some(p)) => Some(speedup(s.median(), p.median())),
            _ => None,
        }
    }

    pub fn efficiency(&self) -> Option<f64> {
        self.speedup().map(|s| efficiency(s, self.threads))
    }

    /// 逐次版の中央値をスレッド数で均等に割った時間
    pub fn ideal_parallel(&self) -> Option<Duration> {
        let s = self.sequential.as_ref()?;
        (self.threads > 0).then(|| s.median() / self.threads as u32)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "- Summary ({}):", self.kernel)?;
        writeln!(f, "   - Size: {}", self.size)?;
        writeln!(f, "   - Threads: {}", self.threads)?;
        if let Some(s) = &self.sequential {
            writeln!(f, "   - Sequential time: {:?}", s.median())?;
        }
        if let Some(p) = &self.parallel {
            writeln!(f, "   - Parallel time: {:?}", p.median())?;
        }
        if let (Some(speedup), Some(efficiency), Some(p), Some(ideal)) = (
            self.speedup(),
            self.efficiency(),
            &self.parallel,
            self.ideal_parallel(),
        ) {
            writeln!(f, "   - Speedup: {speedup:.3}x")?;
            writeln!(
                f,
                "   - Efficiency: {}% (took {:?} vs {:?} ideal)",
                (efficiency * 100.0) as i64,
                p.median(),
                ideal
            )?;
        }
        if let Some(equal) = self.equal {
            writeln!(f, "   - Results equal: {}", if equal { "Yes" } else { "No" })?;
        }
        Ok(())
    }
}

/// 任意のクロージャで与えた2つの版を測定し、出力を照合する
pub fn compare_with<T, S, P>(
    kernel: &'static str,
    size: usize,
    threads: usize,
    options: &BenchOptions,
    sequential: S,
    parallel: P,
) -> KernelResult<Comparison>
where
    T: Equivalent,
    S: FnMut() -> KernelResult<T>,
    P: FnMut() -> KernelResult<T>,
{
    let seq = if options.run_sequential {
        Some(sample(options.warmup, options.samples.max(1), sequential)?)
    } else {
        None
    };
    let par = if options.run_parallel {
        Some(sample(options.warmup, options.samples.max(1), parallel)?)
    } else {
        None
    };

    let equal = match (&seq, &par) {
        (Some((_, a)), Some((_, b))) => Some(a.equivalent(b, options.tolerance)),
        _ => None,
    };
    debug!("{}: size={} threads={} equal={:?}", kernel, size, threads, equal);

    Ok(Comparison {
        kernel,
        size,
        threads,
        sequential: seq.map(|(s, _)| s),
        parallel: par.map(|(s, _)| s),
        equal,
    })
}

pub fn compare<K>(
    problem: &K::Problem,
    params: &K::Params,
    size: usize,
    config: &ParallelConfig,
    options: &BenchOptions,
) -> KernelResult<Comparison>
where
    K: Kernel,
    K::Output: Equivalent,
{
    compare_with(
        K::NAME,
        size,
        config.workers,
        options,
        || K::run_sequential(problem, params),
        || K::run_parallel(problem, params, config),
    )
}
