// Application layer: wires settings, adapters and core pipelines into runnable jobs.

pub mod jobs;
