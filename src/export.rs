// Catalog export to CSV
//
// One flat row per college. Unranked and unknown values are written as
// empty cells so spreadsheets sort them after real numbers.

use crate::entities::College;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tracing::info;

#[derive(Debug, Serialize)]
struct CollegeRow<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    college_type: &'a str,
    location: &'a str,
    established: Option<u16>,
    rating: f32,
    reviews: u32,
    students: u32,
    courses: u32,
    placement_rate: f32,
    avg_package: &'a str,
    nirf_rank: Option<u32>,
    qs_rank: Option<u32>,
    tuition: &'a str,
    hostel: &'a str,
    top_recruiters: String,
}

impl<'a> From<&'a College> for CollegeRow<'a> {
    fn from(c: &'a College) -> Self {
        Self {
            id: &c.id,
            name: &c.name,
            college_type: &c.college_type,
            location: &c.location,
            established: c.established_year,
            rating: c.rating,
            reviews: c.review_count,
            students: c.students_count,
            courses: c.courses_count,
            placement_rate: c.placement_rate,
            avg_package: &c.avg_package,
            nirf_rank: c.rankings.nirf.value(),
            qs_rank: c.rankings.qs.value(),
            tuition: &c.fees.tuition,
            hostel: &c.fees.hostel,
            top_recruiters: c.top_recruiters.join("; "),
        }
    }
}

/// Write `colleges` as CSV with a header row; returns rows written
pub fn write_csv<W: Write>(colleges: &[College], writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for college in colleges {
        wtr.serialize(CollegeRow::from(college))?;
    }
    wtr.flush()?;
    Ok(colleges.len())
}

pub fn export_csv(colleges: &[College], path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path)?;
    let rows = write_csv(colleges, file)?;
    info!(path = %path.display(), rows, "Exported catalog");
    Ok(rows)
}
