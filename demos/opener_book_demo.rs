use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    dle_solver::example_apps::run_openers(std::env::args().skip(1))
}
