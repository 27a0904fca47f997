//! Badge listing

use verdant::stats::BadgeRegistry;

pub fn badges_command() {
    let registry = BadgeRegistry::builtin();
    println!("Badges ({}):\n", registry.len());
    for badge in registry.iter() {
        println!("  {:<9} {:<20} {}", badge.icon, badge.id.as_str(), badge.title_key);
    }
}
