pub mod generator;
pub mod loaders;
pub mod render;
pub mod scene;

// Re-export common types
pub use generator::{load_config, DatasetGenerator, GenerationConfig, SplitConfig};
pub use loaders::{PrettyClevr, Sample, MAX_OBJECTS};
pub use scene::{Object, Question, Scene};

pub mod logging {
    use env_logger::Builder;
    use std::io::Write;

    pub fn init_logger() {
        Builder::from_env(env_logger::Env::default().default_filter_or("info"))
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}] - {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    record.args()
                )
            })
            .init();
    }
}
