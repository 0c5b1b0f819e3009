//! Common utilities for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(2))
        .measurement_time(std::time::Duration::from_secs(5))
        .sample_size(100)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// `count` distinct identifier tokens with the given version separator
pub fn sample_tokens(count: usize, version_separator: char) -> Vec<String> {
    (0..count)
        .map(|i| {
            format!(
                "publisher-{}.extension_{}{}{}.{}.{}",
                i % 17,
                i,
                version_separator,
                i % 5,
                i % 13,
                i
            )
        })
        .collect()
}

/// List file contents with comments and blank lines mixed in
pub fn sample_list_file(count: usize) -> String {
    let mut content = String::from("# generated extension list\n");
    for (i, token) in sample_tokens(count, '@').into_iter().enumerate() {
        if i % 10 == 0 {
            content.push_str("\n# section\n");
        }
        content.push_str(&token);
        content.push_str("  \n");
    }
    content
}
