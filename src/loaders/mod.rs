pub mod pretty_clevr;

pub use pretty_clevr::{
    ensure_dataset, DatasetError, PrettyClevr, QuestionRecord, Sample, SampleIter, SceneArrays,
    Split, DATASET_URL, MAX_OBJECTS,
};
