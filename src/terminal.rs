mod bullet_points;
mod prompt;

#[cfg(test)]
pub use bullet_points::BufferLineWriter;
pub use bullet_points::{BulletPointPrinter, LineWriter, StdoutLineWriter};
pub use prompt::prompt;
