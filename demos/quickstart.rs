use anyhow::{Result, bail};
use wqp::{Connection, DEFAULT_VERSION};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Uses WQP_DATABASE / WQP_PROGRAM or a `.wqprc` file when set,
    // otherwise the production marsh program.
    let wqp = Connection::from_env().or_else(|_| Connection::new("production", "marsh"))?;
    if !wqp.is_connected() {
        bail!("could not reach WQP at {}", wqp.base_url());
    }

    let details = wqp.result_details()?;
    println!("{} result sets", details.len());

    // Specific conductance at HSL.
    let dates = wqp.result_dates(36289)?;
    println!("{} reading dates", dates.first().map_or(0, |t| t.len()));

    let data = wqp.result_data(
        36289,
        "2019-10-01 00:00:00",
        "2020-08-30 23:59:59",
        DEFAULT_VERSION,
    )?;
    for table in &data {
        println!("{} rows, columns: {}", table.len(), table.columns().join(", "));
    }
    Ok(())
}
