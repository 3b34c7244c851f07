use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    dle_solver::example_apps::run_self_play(std::env::args().skip(1))
}
