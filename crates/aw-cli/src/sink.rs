//! Output sink: one JSON record per line.

use std::path::Path;

use anyhow::{Context, Result};
use aw_collect::RecordStream;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Drains the stream into the output file, or stdout when none is given.
/// A stream closed by cancellation drains what arrived and returns Ok.
pub async fn output_stream(stream: RecordStream, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_stream(stream, &mut writer).await?;
            writer.flush().await.context("failed to flush output")?;
        }
        None => {
            let mut stdout = tokio::io::stdout();
            write_stream(stream, &mut stdout).await?;
            stdout.flush().await.context("failed to flush output")?;
        }
    }
    Ok(())
}

async fn write_stream<W>(mut stream: RecordStream, writer: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(record) = stream.recv().await {
        let mut line = serde_json::to_vec(&record).context("failed to serialize record")?;
        line.push(b'\n');
        writer
            .write_all(&line)
            .await
            .context("failed to write record")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use aw_core::azure;
    use aw_core::models::Tenant;
    use aw_core::pipeline;
    use aw_core::Record;

    use super::*;

    #[tokio::test]
    async fn writes_one_json_object_per_line() {
        let (tx, rx) = pipeline::channel();
        tokio::spawn(async move {
            for name in ["alpha", "beta"] {
                let record = Record::Tenant(Tenant {
                    tenant: azure::Tenant {
                        tenant_id: name.to_string(),
                        display_name: name.to_string(),
                        ..Default::default()
                    },
                });
                if tx.send(record).await.is_err() {
                    return;
                }
            }
        });

        let mut buffer = Vec::new();
        write_stream(rx, &mut buffer).await.unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let record: Record = serde_json::from_str(line).unwrap();
            assert!(matches!(record, Record::Tenant(_)));
        }
        let first: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(first["kind"], "AZTenant");
        assert_eq!(first["data"]["tenantId"], "alpha");
    }
}
