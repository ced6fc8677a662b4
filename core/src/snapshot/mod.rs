pub mod npy;
pub mod writer;

pub use npy::{read_npy, write_npy};
pub use writer::{
    load_snapshot, SnapshotContext, SnapshotFormat, SnapshotKind, SnapshotRecord, SnapshotWriter,
};
