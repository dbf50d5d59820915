fn main() -> Result<(), Box<dyn std::error::Error>> {
    chatpane::cli::main()
}
