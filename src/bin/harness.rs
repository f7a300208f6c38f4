use anyhow::Result;

fn main() -> Result<()> {
    vmmgr::cli::run()
}
