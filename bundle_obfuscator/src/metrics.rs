use prometheus::{IntCounter, Registry};

#[derive(Clone)]
pub struct Metrics {
    pub files_obfuscated: IntCounter,
    pub files_skipped: IntCounter,
    pub outputs_written: IntCounter,
}

impl Metrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let files_obfuscated = IntCounter::new(
            "obfuscator_files_obfuscated_total",
            "Modules or outputs replaced with obfuscated code",
        )?;
        let files_skipped = IntCounter::new(
            "obfuscator_files_skipped_total",
            "Files rejected by the obfuscation filter",
        )?;
        let outputs_written = IntCounter::new(
            "obfuscator_outputs_written_total",
            "Output files written to disk in output mode",
        )?;
        registry.register(Box::new(files_obfuscated.clone()))?;
        registry.register(Box::new(files_skipped.clone()))?;
        registry.register(Box::new(outputs_written.clone()))?;
        Ok(Self {
            files_obfuscated,
            files_skipped,
            outputs_written,
        })
    }
}
