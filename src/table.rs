// src/table.rs
//
// CSV hysteresis table: one row per visited field value.
//
// Columns:
//   index,parity,field_uT,B_T,mx,my,mz,max_torque,steps,stop

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::SweepError;
use crate::hysteresis::{FieldStepRecord, StepOutput};

pub const HEADER: &str = "index,parity,field_uT,B_T,mx,my,mz,max_torque,steps,stop";

pub struct CsvTable<W: Write> {
    w: W,
    rows: usize,
}

impl CsvTable<BufWriter<File>> {
    /// Create (truncate) `path` and write the header.
    pub fn create(path: &Path) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> CsvTable<W> {
    pub fn new(mut w: W) -> std::io::Result<Self> {
        writeln!(w, "{HEADER}")?;
        Ok(Self { w, rows: 0 })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and hand back the writer.
    pub fn finish(mut self) -> std::io::Result<W> {
        self.w.flush()?;
        Ok(self.w)
    }
}

impl<W: Write> StepOutput for CsvTable<W> {
    fn write_step(&mut self, r: &FieldStepRecord) -> Result<(), SweepError> {
        writeln!(
            self.w,
            "{},{},{},{:.16e},{:.16e},{:.16e},{:.16e},{:.16e},{},{}",
            r.index,
            r.parity.sign(),
            r.field.0,
            r.applied_field,
            r.magnetisation[0],
            r.magnetisation[1],
            r.magnetisation[2],
            r.max_torque,
            r.steps,
            r.stop.as_str(),
        )?;
        self.rows += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{MicroTesla, Parity};
    use crate::hysteresis::FieldStop;

    #[test]
    fn rows_follow_the_header() {
        let mut t = CsvTable::new(Vec::new()).unwrap();
        let rec = FieldStepRecord {
            index: 4,
            parity: Parity::Descending,
            field: MicroTesla(400_000),
            applied_field: -0.4,
            magnetisation: [0.0, 0.0, 1.0],
            max_torque: 2.5e-7,
            steps: 300,
            stop: FieldStop::Converged,
        };
        t.write_step(&rec).unwrap();
        assert_eq!(t.rows(), 1);

        let text = String::from_utf8(t.finish().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        let cols: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(cols.len(), HEADER.split(',').count());
        assert_eq!(&cols[..3], &["4", "-1", "400000"]);
        assert_eq!(cols[8], "300");
        assert_eq!(cols[9], "converged");
        assert!((cols[3].parse::<f64>().unwrap() + 0.4).abs() < 1e-15);
    }
}
