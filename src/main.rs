fn main() -> anyhow::Result<()> {
    crewdesk::cli::run()
}
