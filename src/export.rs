use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::client::Post;
use crate::filter::{Category, Network};
use crate::Result;

/// One CSV row. Header names stay in the shape downstream spreadsheets
/// already expect.
#[derive(Debug, Serialize)]
struct Row<'a> {
    #[serde(rename = "Tweet_ID")]
    id: &'a str,
    #[serde(rename = "Date")]
    date: &'a str,
    #[serde(rename = "Username")]
    username: &'a str,
    #[serde(rename = "Text")]
    text: &'a str,
    #[serde(rename = "Complaint_Type")]
    complaint_type: &'static str,
    #[serde(rename = "Mobile_Network")]
    mobile_network: &'static str,
    #[serde(rename = "Retweets")]
    retweets: u64,
    #[serde(rename = "Likes")]
    likes: u64,
    #[serde(rename = "Replies")]
    replies: String,
}

/// Rewrites the whole output file. Called on checkpoints and at the end of
/// the run.
pub fn save_complaints(path: impl AsRef<Path>, complaints: &[Post]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_complaints(file, complaints)
}

fn write_complaints(out: impl Write, complaints: &[Post]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    // serde only emits the header alongside the first record
    if complaints.is_empty() {
        writer.write_record([
            "Tweet_ID",
            "Date",
            "Username",
            "Text",
            "Complaint_Type",
            "Mobile_Network",
            "Retweets",
            "Likes",
            "Replies",
        ])?;
    }
    for post in complaints {
        writer.serialize(Row {
            id: &post.id,
            date: &post.created_at,
            username: &post.user.name,
            text: &post.text,
            complaint_type: Category::classify(&post.text).label(),
            mobile_network: Network::detect(&post.text).label(),
            retweets: post.retweet_count,
            likes: post.favorite_count,
            replies: post
                .reply_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        })?;
    }
    writer.flush()?;
    Ok(())
}
