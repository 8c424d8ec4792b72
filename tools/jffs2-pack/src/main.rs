use std::io::{Error, Result};
use std::{env, fs};
use tiny_jffs2::ROOT_INO;
use tiny_jffs2::pack::{DirentSpec, ImageBuilder, InodeSpec};

fn main() -> Result<()> {
    // args: <input_dir> <out_image>
    let mut args = env::args().skip(1);
    let (Some(dir), Some(out)) = (args.next(), args.next()) else {
        return Err(Error::other("usage: jffs2-pack <input_dir> <out_image>"));
    };

    // Regular files only; the image has no subdirectories.
    let mut items = Vec::new();
    for ent in fs::read_dir(&dir)? {
        let ent = ent?;
        if ent.metadata()?.is_file() {
            let name = ent
                .file_name()
                .into_string()
                .map_err(|name| Error::other(format!("non UTF-8 name {name:?}")))?;
            items.push((name, fs::read(ent.path())?));
        }
    }
    items.sort_by(|a, b| a.0.cmp(&b.0));

    let mut image = ImageBuilder::new();
    for ((name, data), ino) in items.iter().zip(ROOT_INO + 1..) {
        let size = u32::try_from(data.len())
            .map_err(|_| Error::other(format!("{name} is too large")))?;
        image = image
            .dirent(DirentSpec::new(ROOT_INO, 1, ino, name.as_bytes()))
            .map_err(Error::other)?
            .inode(InodeSpec::new(ino, 1).isize(size).data(data));
    }
    let bytes = image.pad_to_erase_block().build();

    fs::write(&out, &bytes)?;
    eprintln!("packed {} files into {out} ({:#x} bytes)", items.len(), bytes.len());
    Ok(())
}
