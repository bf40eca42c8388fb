//! Command execution.
//!
//! Every command works off the registry alone: the front-end never names a
//! function in code, it discovers slots and binds CSV columns to them.

use std::io::Write;

use tracing::{debug, info};

use crate::args::{Args, Command, OptAssignment};
use crate::csv_parser::{parse_csv, ParsedCsv};
use crate::csv_writer::{write_outputs, ColumnValues, OutputColumn, OutputDest};
use crate::error::{CliError, Result};
use ta_abstract::meta::{InputKind, OptInputKind, OutputKind};
use ta_abstract::{FuncDef, ParamHolder, PriceSeries, Registry};

/// Runs the parsed command against the global registry, writing listings
/// and (without `--output`) results to `out`.
///
/// # Errors
///
/// Returns any lookup, parsing, binding or call failure.
pub fn run(args: &Args, out: &mut dyn Write) -> Result<()> {
    run_with(Registry::global(), &args.command, out)
}

/// Runs `command` against `registry`.
///
/// # Errors
///
/// See [`run`].
pub fn run_with(registry: &Registry, command: &Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Groups => {
            for group in registry.groups() {
                writeln!(out, "{group}")?;
            }
        }
        Command::Functions { group } => {
            let names = match group {
                Some(group) => registry.functions_in_group(group)?,
                None => registry.iter().map(|info| info.name).collect(),
            };
            for name in names {
                writeln!(out, "{name}")?;
            }
        }
        Command::Info { name, json } => {
            if *json {
                let description = registry.describe_function(name)?;
                serde_json::to_writer_pretty(&mut *out, &description)?;
                writeln!(out)?;
            } else {
                let handle = registry.lookup(name)?;
                write_info(registry, registry.resolve(handle)?, out)?;
            }
        }
        Command::Run {
            name,
            input,
            opts,
            inputs,
            output,
        } => {
            let csv = parse_csv(input)?;
            info!(function = %name, input = %input, rows = csv.row_count, "running function");
            let result = execute(registry, name, &csv, opts, inputs)?;
            let dest = OutputDest::from_arg(output.as_deref());
            match dest {
                OutputDest::Stdout => result.write(&csv, out)?,
                OutputDest::File(_) => result.write(&csv, &mut *dest.writer()?)?,
            }
        }
    }
    Ok(())
}

fn flag_names<B: bitflags::Flags>(flags: B) -> String {
    let names: Vec<&str> = flags.iter_names().map(|(name, _)| name).collect();
    names.join(" | ")
}

fn write_info(registry: &Registry, def: &FuncDef, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{} - {}", def.name, def.hint)?;
    writeln!(out, "Group: {}", def.group)?;
    if !def.flags.is_empty() {
        writeln!(out, "Flags: {}", flag_names(def.flags))?;
    }

    writeln!(out, "Inputs:")?;
    for input in def.inputs {
        match input.kind {
            InputKind::Price(flags) => {
                writeln!(out, "  {} (price: {})", input.param_name, flag_names(flags))?;
            }
            kind => writeln!(out, "  {} ({})", input.param_name, kind.label())?,
        }
    }

    if !def.opt_inputs.is_empty() {
        writeln!(out, "Optional inputs:")?;
    }
    for opt in def.opt_inputs {
        let domain = match opt.kind {
            OptInputKind::IntegerRange(r) => format!("{}..={}", r.min, r.max),
            OptInputKind::RealRange(r) => format!("{}..={}", r.min, r.max),
            OptInputKind::IntegerList(items) => items
                .iter()
                .map(|item| format!("{}={}", item.value, item.label))
                .collect::<Vec<_>>()
                .join(", "),
            OptInputKind::RealList(items) => items
                .iter()
                .map(|item| format!("{}={}", item.value, item.label))
                .collect::<Vec<_>>()
                .join(", "),
        };
        writeln!(
            out,
            "  {} ({}, default {}, {domain}): {}",
            opt.param_name,
            opt.kind.label(),
            opt.seed_value(),
            opt.hint
        )?;
    }

    writeln!(out, "Outputs:")?;
    for output in def.outputs {
        writeln!(out, "  {} ({})", output.param_name, output.kind.label())?;
    }

    let handle = registry.lookup(def.name)?;
    writeln!(out, "Lookback (defaults): {}", registry.alloc(handle)?.lookback()?)?;
    Ok(())
}

/// Data bound to one input slot.
enum Source<'c> {
    Price(PriceSeries<'c>),
    Real(&'c [f64]),
    Integer(Vec<i32>),
}

/// Output storage for one output slot.
enum Buffer {
    Real(Vec<f64>),
    Integer(Vec<i32>),
}

/// Outputs of one run, with the produced range.
struct RunResult {
    def: &'static FuncDef,
    buffers: Vec<Buffer>,
    range: ta_abstract::OutputRange,
}

impl RunResult {
    fn write(&self, csv: &ParsedCsv, writer: &mut dyn Write) -> Result<()> {
        let columns: Vec<OutputColumn<'_>> = self
            .def
            .outputs
            .iter()
            .zip(&self.buffers)
            .map(|(info, buffer)| OutputColumn {
                name: info.param_name,
                values: match buffer {
                    Buffer::Real(values) => ColumnValues::Real(values),
                    Buffer::Integer(values) => ColumnValues::Integer(values),
                },
            })
            .collect();
        write_outputs(writer, &columns, csv.dates.as_deref(), self.range)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: f64) -> Option<i32> {
    let integral = value.fract() == 0.0
        && value >= f64::from(i32::MIN)
        && value <= f64::from(i32::MAX);
    integral.then_some(value as i32)
}

fn column<'c>(csv: &'c ParsedCsv, name: Option<&String>) -> Result<&'c [f64]> {
    match name {
        Some(name) => csv.get_column(name).ok_or_else(|| CliError::InvalidArgument {
            argument: "inputs".to_string(),
            reason: format!("no column named '{name}'"),
            suggestion: Some(format!("Available columns: {}", csv.headers.join(", "))),
        }),
        None => csv.get_close().ok_or_else(|| {
            CliError::invalid("inputs", "no close column; name the input columns with --inputs")
        }),
    }
}

fn resolve_sources<'c>(
    def: &FuncDef,
    csv: &'c ParsedCsv,
    names: &[String],
) -> Result<Vec<Source<'c>>> {
    let series_slots = def
        .inputs
        .iter()
        .filter(|input| !matches!(input.kind, InputKind::Price(_)))
        .count();
    if names.len() > series_slots {
        return Err(CliError::invalid(
            "inputs",
            format!("{} takes {series_slots} series input(s), got {}", def.name, names.len()),
        ));
    }

    let mut names = names.iter();
    def.inputs
        .iter()
        .map(|input| match input.kind {
            InputKind::Price(flags) => Ok(Source::Price(csv.price_series(flags)?)),
            InputKind::Real => Ok(Source::Real(column(csv, names.next())?)),
            InputKind::Integer => {
                let name = names.next();
                column(csv, name)?
                    .iter()
                    .map(|&v| as_integer(v))
                    .collect::<Option<Vec<_>>>()
                    .map(Source::Integer)
                    .ok_or_else(|| {
                        CliError::invalid(
                            "inputs",
                            format!("{} needs integral values", input.param_name),
                        )
                    })
            }
        })
        .collect()
}

fn apply_opt(holder: &mut ParamHolder<'_, '_>, def: &FuncDef, opt: &OptAssignment) -> Result<()> {
    let (index, info) = def
        .opt_inputs
        .iter()
        .enumerate()
        .find(|(_, info)| opt.matches(info.param_name))
        .ok_or_else(|| {
            let known: Vec<&str> = def.opt_inputs.iter().map(|info| info.param_name).collect();
            CliError::InvalidArgument {
                argument: "opt".to_string(),
                reason: format!("{} has no optional input '{}'", def.name, opt.name),
                suggestion: Some(if known.is_empty() {
                    format!("{} takes no optional inputs", def.name)
                } else {
                    format!("Known optional inputs: {}", known.join(", "))
                }),
            }
        })?;

    if info.kind.is_integer() {
        let value = as_integer(opt.value).ok_or_else(|| {
            CliError::invalid("opt", format!("{} needs an integer value", info.param_name))
        })?;
        holder.set_opt_input_integer(index, value)?;
    } else {
        holder.set_opt_input_real(index, opt.value)?;
    }
    debug!(param = info.param_name, value = opt.value, "optional input set");
    Ok(())
}

fn execute(
    registry: &Registry,
    name: &str,
    csv: &ParsedCsv,
    opts: &[OptAssignment],
    names: &[String],
) -> Result<RunResult> {
    let handle = registry.lookup(name)?;
    let def = registry.resolve(handle)?;
    if csv.row_count == 0 {
        return Err(CliError::invalid("input", "CSV file has no data rows"));
    }

    let sources = resolve_sources(def, csv, names)?;
    let mut buffers: Vec<Buffer> = def
        .outputs
        .iter()
        .map(|output| match output.kind {
            OutputKind::Real => Buffer::Real(vec![f64::NAN; csv.row_count]),
            OutputKind::Integer => Buffer::Integer(vec![0; csv.row_count]),
        })
        .collect();

    let range = {
        let mut holder = registry.alloc(handle)?;
        for (index, source) in sources.iter().enumerate() {
            match source {
                Source::Price(series) => holder.set_input_price(index, *series)?,
                Source::Real(values) => holder.set_input_real(index, values)?,
                Source::Integer(values) => holder.set_input_integer(index, values)?,
            }
        }
        for opt in opts {
            apply_opt(&mut holder, def, opt)?;
        }
        for (index, buffer) in buffers.iter_mut().enumerate() {
            match buffer {
                Buffer::Real(values) => holder.set_output_real(index, values)?,
                Buffer::Integer(values) => holder.set_output_integer(index, values)?,
            }
        }
        holder.call(0, csv.row_count - 1)?
    };
    debug!(
        function = def.name,
        beg_idx = range.beg_idx,
        nb_element = range.nb_element,
        "call complete"
    );

    Ok(RunResult {
        def,
        buffers,
        range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::parse_opt;
    use crate::csv_parser::parse_csv_from_reader;

    fn csv(text: &str) -> ParsedCsv {
        parse_csv_from_reader(text.as_bytes()).unwrap()
    }

    fn ramp(rows: usize) -> ParsedCsv {
        let mut text = String::from("date,open,high,low,close,volume\n");
        for i in 0..rows {
            let c = 10.0 + i as f64;
            text.push_str(&format!("d{i},{c},{},{},{c},100\n", c + 1.0, c - 1.0));
        }
        csv(&text)
    }

    fn render(result: &RunResult, csv: &ParsedCsv) -> String {
        let mut buf = Vec::new();
        result.write(csv, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn listing(command: Command) -> String {
        let mut buf = Vec::new();
        run_with(Registry::global(), &command, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_sma_on_close_column() {
        let data = ramp(5);
        let opts = [parse_opt("timeperiod=3").unwrap()];
        let result = execute(Registry::global(), "SMA", &data, &opts, &[]).unwrap();
        assert_eq!(result.range.beg_idx, 2);
        assert_eq!(result.range.nb_element, 3);
        assert_eq!(render(&result, &data), "date,outReal\nd2,11\nd3,12\nd4,13\n");
    }

    #[test]
    fn test_named_inputs_feed_correl() {
        let data = ramp(6);
        let inputs = ["high".to_string(), "low".to_string()];
        let opts = [parse_opt("optInTimePeriod=3").unwrap()];
        let result = execute(Registry::global(), "CORREL", &data, &opts, &inputs).unwrap();
        assert_eq!(result.range.beg_idx, 2);
        let Buffer::Real(values) = &result.buffers[0] else {
            panic!("CORREL produces a real output");
        };
        assert!((values[0] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_price_slot_bound_from_columns() {
        let data = ramp(4);
        let result = execute(Registry::global(), "TYPPRICE", &data, &[], &[]).unwrap();
        assert_eq!(result.range.nb_element, 4);
        let Buffer::Real(values) = &result.buffers[0] else {
            panic!("TYPPRICE produces a real output");
        };
        assert!((values[0] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_missing_price_column() {
        let data = csv("close\n1\n2\n3\n");
        let err = execute(Registry::global(), "ATR", &data, &[], &[]).err().unwrap();
        assert!(matches!(err, CliError::CsvParseError { .. }));
    }

    #[test]
    fn test_unknown_opt_lists_known_names() {
        let data = ramp(5);
        let opts = [parse_opt("fastperiod=3").unwrap()];
        let err = execute(Registry::global(), "SMA", &data, &opts, &[]).err().unwrap();
        assert!(err.to_string().contains("optInTimePeriod"));
    }

    #[test]
    fn test_fractional_value_for_integer_opt() {
        let data = ramp(5);
        let opts = [parse_opt("timeperiod=2.5").unwrap()];
        let err = execute(Registry::global(), "SMA", &data, &opts, &[]).err().unwrap();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_too_many_inputs() {
        let data = ramp(5);
        let inputs = ["open".to_string(), "close".to_string()];
        let err = execute(Registry::global(), "SMA", &data, &[], &inputs).err().unwrap();
        assert!(err.to_string().contains("1 series input"));
    }

    #[test]
    fn test_too_short_series_yields_header_only() {
        let data = ramp(3);
        let result = execute(Registry::global(), "SMA", &data, &[], &[]).unwrap();
        assert!(result.range.is_empty());
        assert_eq!(render(&result, &data), "date,outReal\n");
    }

    #[test]
    fn test_unknown_function() {
        let data = ramp(3);
        let err = execute(Registry::global(), "NOPE", &data, &[], &[]).err().unwrap();
        assert!(matches!(
            err,
            CliError::FunctionError {
                source: ta_abstract::Error::FunctionNotFound { .. }
            }
        ));
    }

    #[test]
    fn test_groups_listing() {
        let out = listing(Command::Groups);
        assert_eq!(out.lines().count(), 10);
        assert!(out.starts_with("Math Operators\n"));
    }

    #[test]
    fn test_functions_listing_by_group() {
        let out = listing(Command::Functions {
            group: Some("Volatility Indicators".to_string()),
        });
        let names: Vec<&str> = out.lines().collect();
        assert!(names.contains(&"ATR"));
        assert!(!names.contains(&"SMA"));
    }

    #[test]
    fn test_info_text() {
        let out = listing(Command::Info {
            name: "BBANDS".to_string(),
            json: false,
        });
        assert!(out.starts_with("BBANDS - "));
        assert!(out.contains("Group: Overlap Studies"));
        assert!(out.contains("optInNbDevUp"));
        assert!(out.contains("outRealLowerBand"));
        assert!(out.contains("Lookback (defaults): 4"));
    }

    #[test]
    fn test_info_json() {
        let out = listing(Command::Info {
            name: "ATR".to_string(),
            json: true,
        });
        let json: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(json["name"], "ATR");
        assert_eq!(json["group_name"], "Volatility Indicators");
    }
}
