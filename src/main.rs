pub mod ws;
pub mod rules;
pub mod compile;
pub mod null_kind;
pub mod model;
pub mod path_de;
pub mod cli;

fn main() -> anyhow::Result<()> {
    let command_line_interface = cli::CommandLineInterface::load();
    command_line_interface.run()
}
