//! Example: well-known user locations and the roots of this host
//!
//! Prints the home directory, the XDG user directories, the trash folder and
//! the root locations the navigation tree would start from.

use arbor_services::places::{downloads_dir, home_dir, trash_dir, user_special_dir, UserDirectory};
use arbor_services::roots::{enumerate_roots, select_root_enumerator, HostProbe};
use arbor_services::{select_accessor, AccessorBackend};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match home_dir() {
        Some(home) => println!("Home directory: {}", home.display()),
        None => eprintln!("Failed to get home directory"),
    }

    let directories = [
        UserDirectory::Desktop,
        UserDirectory::Documents,
        UserDirectory::Download,
        UserDirectory::Music,
        UserDirectory::Pictures,
        UserDirectory::Videos,
        UserDirectory::PublicShare,
        UserDirectory::Templates,
    ];

    println!("\nSpecial User Directories:");
    for dir in directories {
        match user_special_dir(dir).await {
            Some(path) => println!("  {:?}: {}", dir, path.display()),
            None => println!("  {:?}: (not available)", dir),
        }
    }

    if let Some(downloads) = downloads_dir().await {
        println!("\nDownloads: {}", downloads.display());
    }
    if let Some(trash) = trash_dir() {
        println!("Trash: {}", trash.display());
    }

    let probe = HostProbe::detect();
    let accessor = select_accessor(AccessorBackend::Native);
    let enumerator = select_root_enumerator(&probe, accessor);
    let listing = enumerate_roots(enumerator.as_ref()).await;

    println!("\nRoots ({}):", enumerator.name());
    for root in &listing.directories {
        println!("  {}", root.display());
    }
    if let Some(error) = listing.error {
        eprintln!("  Error - {}", error);
    }

    Ok(())
}
