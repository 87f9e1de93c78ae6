//! List posts from the content repository

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

/// Print every post, following the listing cursors to the end
pub async fn run(site: &Site) -> Result<()> {
    let generator = Generator::new(site, site.content_source()?)?;

    let mut listing = generator.first_page().await?;
    listing.load_all(generator.source()).await?;

    println!("Posts ({}):", listing.len());
    for entry in listing.entries() {
        let post = &entry.summary;
        println!(
            "  {} - {} by {} [{}]",
            entry.published.as_deref().unwrap_or("unpublished"),
            post.title,
            post.author,
            post.slug()
        );
    }

    Ok(())
}
