fn main() -> Result<(), Box<dyn std::error::Error>> {
    ragchat::cli::main()
}
