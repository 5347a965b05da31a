//! This module is in charge of outputting the final analysis results to the
//! standard output and to disk

use crate::{
    config::Configuration,
    histogram::Histogram,
    numeric::{floats, Float},
    resfin::FinalResults,
};
use eyre::{Result, WrapErr};
use log::info;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    time::Duration,
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

/// Number of significant digits in file output
const SIG_DIGITS: usize = (floats::DIGITS - 1) as usize;

/// Output the analysis results to the console and to disk
pub fn dump_results(cfg: &Configuration, res_fin: &FinalResults, elapsed_time: Duration) -> Result<()> {
    // Print out the cutflow table on stdout
    res_fin.print_cutflow();

    // Compute a timestamp of when the run ended
    let timestamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .wrap_err("Failed to format the timestamp")?;

    // Write the results file
    let path = &cfg.output_path;
    let file = File::create(path).wrap_err_with(|| format!("Could not create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    write_results(&mut writer, cfg, res_fin, elapsed_time, &timestamp)
        .and_then(|()| writer.flush())
        .wrap_err_with(|| format!("Could not write {}", path.display()))?;
    info!("Results written to {}", path.display());
    Ok(())
}

/// Write the results file contents
fn write_results(
    out: &mut impl Write,
    cfg: &Configuration,
    res_fin: &FinalResults,
    elapsed_time: Duration,
    timestamp: &str,
) -> io::Result<()> {
    let rule = "---------------------------------------------";
    writeln_kv(out, timestamp)?;
    writeln_kv(out, rule)?;
    writeln_kv(out, ("Input file", cfg.input_path.display().to_string().as_str()))?;
    writeln_kv(out, ("Processed events", res_fin.processed_events))?;
    writeln_kv(out, ("Luminosity (fb-1)", cfg.normalization.luminosity))?;
    writeln_kv(out, ("Cross-section (pb)", cfg.normalization.cross_section))?;
    writeln_kv(out, ("Expected events", cfg.normalization.expected_events()))?;
    writeln_kv(out, ("Event weight", res_fin.weight))?;
    writeln_kv(out, ("Processing time (s)", elapsed_time.as_secs_f64() as Float))?;
    writeln_kv(out, ("Distributions", res_fin.histograms.len()))?;
    writeln_kv(out, rule)?;

    // Cutflow table
    writeln!(out)?;
    for row in &res_fin.cutflow {
        write!(out, " {:<22}{:>12}  ", row.label, row.count)?;
        write_engineering(out, row.efficiency, SIG_DIGITS)?;
        write!(out, "  ")?;
        write_engineering(out, row.weighted_count, SIG_DIGITS)?;
        writeln!(out)?;
    }

    // Distributions
    for (name, hist) in res_fin.histograms.iter() {
        writeln!(out)?;
        write_histogram(out, name, hist)?;
    }
    Ok(())
}

/// Dump a histogram: binning, statistics, then one line per bin
fn write_histogram(out: &mut impl Write, name: &str, hist: &Histogram) -> io::Result<()> {
    let (x_min, x_max) = hist.range();
    writeln_kv(out, ("Histogram", name))?;
    writeln_kv(out, ("Title", hist.title()))?;
    writeln_kv(out, ("Bins", hist.num_bins()))?;
    writeln_kv(out, ("Lower edge", x_min))?;
    writeln_kv(out, ("Upper edge", x_max))?;
    writeln_kv(out, ("Entries", hist.entries() as usize))?;
    writeln_kv(out, ("Underflow", hist.underflow()))?;
    writeln_kv(out, ("Overflow", hist.overflow()))?;
    writeln_kv(out, ("Integral", hist.integral()))?;
    for bin in 0..hist.num_bins() {
        write!(out, " {:>4} ", bin)?;
        write_engineering(out, hist.bin_low_edge(bin), SIG_DIGITS)?;
        write!(out, " ")?;
        write_engineering(out, hist.bin_content(bin), SIG_DIGITS)?;
        write!(out, " ")?;
        write_engineering(out, hist.bin_error(bin), SIG_DIGITS)?;
        writeln!(out)?;
    }
    Ok(())
}

/// Write one line of key/value output, indented by one space
fn writeln_kv(out: &mut impl Write, data: impl WriteKv) -> io::Result<()> {
    write!(out, " ")?;
    data.write(out)?;
    writeln!(out)
}

/// Things which can be written as part of a key/value results line
trait WriteKv: Sized {
    /// Write down `self` to the output
    fn write(self, out: &mut impl Write) -> io::Result<()>;
}

impl WriteKv for &str {
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{self}")
    }
}

impl WriteKv for usize {
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{self}")
    }
}

impl WriteKv for Float {
    // Floats are printed in the manner of C's %g
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write_engineering(out, self, SIG_DIGITS)
    }
}

impl<T: WriteKv> WriteKv for (&str, T) {
    // Keys are padded to a fixed-size column for readability
    fn write(self, out: &mut impl Write) -> io::Result<()> {
        write!(out, "{:<24}: ", self.0)?;
        self.1.write(out)
    }
}

/// Write a floating-point number using "engineering" notation
///
/// Analogous to the %g format of the C printf function, this switches between
/// positional and scientific notation depending on the order of magnitude of
/// the number, keeping `sig_digits` significant digits in both cases.
///
fn write_engineering(out: &mut impl Write, x: Float, sig_digits: usize) -> io::Result<()> {
    if x == 0. {
        return write!(out, "0");
    }
    if !x.is_finite() {
        return write!(out, "{x}");
    }
    let exponent = x.abs().log10().floor() as isize;
    let sig_digits = sig_digits.max(1) as isize;
    if exponent < -4 || exponent >= sig_digits {
        write!(out, "{:.1$e}", x, (sig_digits - 1) as usize)
    } else {
        // Digits after the decimal point needed to keep sig_digits in total
        let decimals = (sig_digits - 1 - exponent).max(0) as usize;
        let positional = format!("{x:.decimals$}");
        if positional.contains('.') {
            write!(out, "{}", positional.trim_end_matches('0').trim_end_matches('.'))
        } else {
            write!(out, "{positional}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cutflow::Cutflow, resacc::ResultsAccumulator};

    fn engineering(x: Float, sig_digits: usize) -> String {
        let mut buf = Vec::new();
        write_engineering(&mut buf, x, sig_digits).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn engineering_notation() {
        assert_eq!(engineering(0., 6), "0");
        assert_eq!(engineering(1., 6), "1");
        assert_eq!(engineering(2.5, 6), "2.5");
        assert_eq!(engineering(-123.456, 6), "-123.456");
        assert_eq!(engineering(100000., 6), "100000");
        assert_eq!(engineering(1234567., 6), "1.23457e6");
        assert_eq!(engineering(0.001, 6), "0.001");
        assert_eq!(engineering(0.00001, 6), "1.00000e-5");
        assert_eq!(engineering(Float::INFINITY, 6), "inf");
    }

    #[test]
    fn results_file_layout() {
        let cfg = Configuration::default();
        let cutflow = Cutflow::standard();
        let mut acc = ResultsAccumulator::new(&cutflow, 2.);
        acc.count_event();
        acc.fill_weighted("h_MET", 30.);
        let res = acc.finalize();

        let mut buf = Vec::new();
        write_results(&mut buf, &cfg, &res, Duration::from_millis(1500), "2024-01-01T00:00:00Z").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines = text.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], " 2024-01-01T00:00:00Z");
        assert!(text.contains(" Processed events        : 1\n"));
        assert!(text.contains(" Event weight            : 2\n"));
        assert!(text.contains(" Processing time (s)     : 1.5\n"));
        assert!(text.contains("Cut5: MET<140 GeV"));
        assert!(text.contains(" Histogram               : h_MET\n"));
        assert_eq!(text.matches(" Histogram ").count(), res.histograms.len());
        let met_bin = lines
            .iter()
            .skip_while(|line| !line.contains(": h_MET"))
            .find(|line| line.starts_with("    6 "))
            .unwrap();
        assert_eq!(met_bin.split_whitespace().collect::<Vec<_>>(), ["6", "30", "2", "2"]);
    }

    #[test]
    fn dump_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Configuration {
            output_path: dir.path().join("results.txt"),
            ..Configuration::default()
        };
        let cutflow = Cutflow::standard();
        let res = ResultsAccumulator::new(&cutflow, 1.).finalize();
        dump_results(&cfg, &res, Duration::ZERO).unwrap();
        let text = std::fs::read_to_string(&cfg.output_path).unwrap();
        assert!(text.contains(" Processed events        : 0\n"));

        let bad_cfg = Configuration {
            output_path: dir.path().join("missing").join("results.txt"),
            ..Configuration::default()
        };
        assert!(dump_results(&bad_cfg, &res, Duration::ZERO).is_err());
    }
}
