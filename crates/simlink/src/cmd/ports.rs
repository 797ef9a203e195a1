use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use simlink::model::{CounterSpec, PortSpec, RegisterModel};

use crate::cmd::PortsArgs;
use crate::exit::{model_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct PortsOutput<'a> {
    name: &'a str,
    ports: Vec<&'a PortSpec>,
    counter: Option<CounterSpec>,
}

pub fn run(args: PortsArgs, format: OutputFormat) -> CliResult<i32> {
    let model = RegisterModel::load(&args.model)
        .map_err(|err| model_error(&format!("loading {}", args.model.display()), err))?;
    let output = PortsOutput {
        name: model.name(),
        ports: model.ports().collect(),
        counter: model.counter(),
    };
    print_ports(&output, format);
    Ok(SUCCESS)
}

fn print_ports(output: &PortsOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "WIDTH", "DIRECTION", "MONITOR"]);
            for port in &output.ports {
                table.add_row(vec![
                    format!("{:X}", port.id),
                    port.name.clone(),
                    port.width.to_string(),
                    port.direction.as_str().to_string(),
                    if port.monitor { "yes" } else { "" }.to_string(),
                ]);
            }
            println!("{table}");
            if let Some(counter) = output.counter {
                println!("counter: clock {:X} -> output {:X}", counter.clock, counter.output);
            }
        }
        OutputFormat::Pretty => {
            println!("{} ({} ports)\n", output.name, output.ports.len());
            for port in &output.ports {
                println!(
                    "  {:>4X}  {:<16} {:>4} bits  {}{}",
                    port.id,
                    port.name,
                    port.width,
                    port.direction.as_str(),
                    if port.monitor { ", monitored" } else { "" }
                );
            }
        }
        OutputFormat::Raw => {
            for port in &output.ports {
                println!("{:X} {}", port.id, port.name);
            }
        }
    }
}
