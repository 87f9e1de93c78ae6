//! Show a single post

use anyhow::Result;

use crate::generator::Generator;
use crate::Site;

/// Print the title, date and reading time of the post behind `slug`
pub async fn run(site: &Site, slug: &str) -> Result<()> {
    let generator = Generator::new(site, site.content_source()?)?;
    let helpers = generator.helpers();

    let post = match generator.fetch_post(slug).await {
        Ok(post) => post,
        Err(e) if e.is_not_found() => anyhow::bail!("{}: {}", helpers.t("not_found"), slug),
        Err(e) => return Err(e.into()),
    };

    let reading_time = post.reading_time(site.config.words_per_minute);

    println!("{}", post.title);
    if !post.subtitle.is_empty() {
        println!("{}", post.subtitle);
    }
    println!();
    if let Some(date) = helpers.dates().format_opt(post.first_publication_date.as_ref()) {
        println!("  Published: {}", date);
    }
    println!("  Author:    {}", post.author);
    println!(
        "  Reading:   {} ({} words)",
        helpers.i18n().get_count("reading_time", reading_time.minutes),
        reading_time.words
    );
    println!("  Sections:  {}", post.content.len());
    println!("  URL:       {}", helpers.post_url(post.slug()));

    Ok(())
}
