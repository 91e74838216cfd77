use std::fmt::Write;

use axum::response::Html;

use crate::probe::descriptors;

// ─── GET / ───────────────────────────────────────────────────────

/// Landing page: version, a probe form and the metric catalogue.
pub async fn index() -> Html<String> {
    let mut metrics = String::new();
    for d in descriptors::ALL {
        let _ = writeln!(
            metrics,
            "      <tr><td><code>{}</code></td><td>{}</td></tr>",
            d.name, d.help
        );
    }

    Html(format!(
        r#"<html>
  <head><title>iperf3-exporter</title></head>
  <body>
    <h1>iperf3-exporter</h1>
    <p>{version}</p>
    <form action="/probe" method="GET">
      <input type="text" name="target" value="target" />
      <input type="text" name="duration" value="5s" />
      <input type="submit" value="Probe" />
    </form>
    <h2>Metrics</h2>
    <table>
{metrics}    </table>
  </body>
</html>
"#,
        version = env!("CARGO_PKG_VERSION"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_version_form_and_catalogue() {
        let Html(page) = index().await;

        assert!(page.contains(env!("CARGO_PKG_VERSION")));
        assert!(page.contains(r#"<form action="/probe" method="GET">"#));
        for d in descriptors::ALL {
            assert!(page.contains(d.name), "{} missing", d.name);
        }
    }
}
