/// Display version information
pub fn execute() {
    println!("ballot {}", env!("CARGO_PKG_VERSION"));
    println!("Single-administrator plurality ballot");
}
