use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    ollachat::cli::main()
}
