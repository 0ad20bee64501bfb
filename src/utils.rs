use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};
use std::{fs, io};

pub(crate) fn file_to_vec<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
    let file_in = fs::File::open(filename)?;
    let file_reader = BufReader::new(file_in);
    Ok(file_reader.lines().filter_map(io::Result::ok).collect())
}

pub(crate) fn trace(l_step: &str, start: Instant, elapsed: Duration) -> Duration {
    log::trace!(
        "TIME | Total={:.2?} | {}={:.2?}",
        start.elapsed(),
        l_step,
        start.elapsed() - elapsed
    );
    start.elapsed()
}

pub(crate) fn human_bytes(size: f64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut size = size;
    let mut unit = 0;
    while size >= 1024. && unit < UNITS.len() - 1 {
        size /= 1024.;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_bytes_scales() {
        assert_eq!(human_bytes(512.), "512.0 B");
        assert_eq!(human_bytes(2048.), "2.0 KiB");
        assert_eq!(human_bytes(3. * 1024. * 1024.), "3.0 MiB");
    }
}
