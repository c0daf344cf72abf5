use anyhow::{anyhow, Result};
use indoc::indoc;

fn main() -> Result<()> {
    let data = indoc! {r#"
        # HELP http_requests_total Requests served.
        # TYPE http_requests_total counter
        http_requests_total{code="200"} 1027
        http_requests_total{code="500"} 3
        # TYPE http_request_duration_seconds histogram
        http_request_duration_seconds_bucket{le="0.05"} 24054
        http_request_duration_seconds_bucket{le="+Inf"} 144320
        http_request_duration_seconds_sum 53423
        http_request_duration_seconds_count 144320
        # TYPE rpc_duration_seconds summary
        rpc_duration_seconds{quantile="0.5"} 4773
        rpc_duration_seconds_sum 1.7560473e+07
        rpc_duration_seconds_count 2693
    "#};

    let mut args = std::env::args();

    let progname = args.next().ok_or(anyhow!("ARGV[0] was not set??"))?;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" => {
                println!("Usage: {} [--print-exposition]", progname);
                return Ok(());
            }
            "--print-exposition" => {
                println!("Exposition:\n\n{}", data);
            }
            arg => return Err(anyhow!("Unknown argument: {}", arg)),
        }
    }

    for family in promflat::parse_families(data)? {
        println!("{} ({:?})", family.name, family.metric_type);
        if let Some(help) = family.help.as_deref() {
            println!("{}", help);
        }

        for sample in family.samples.iter() {
            println!("  {}", sample);
        }
        println!();
    }

    println!("{}", serde_json::to_string_pretty(&promflat::parse_str(data)?)?);

    Ok(())
}
