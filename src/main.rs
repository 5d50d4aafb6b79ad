use std::error::Error;

use structopt::StructOpt;

use lib::Config;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = Config::from_args();
    lib::go(config)
}
