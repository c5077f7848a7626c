//! Build a flash map from answers to a fixed sequence of prompts.
//!
//! The caller supplies the answers, usually one line of stdin per prompt,
//! in this order: base address, size, image name, number of areas, then
//! offset, size, name and raw flags of every area. Numbers take the forms
//! accepted by [`parse_number`].

use crate::input_kv_pair::parse_number;
use crate::{Error, Fmap};
use alloc::{format, string::String};

fn answer_number<T, F, E>(ask: &mut F, prompt: &str, key: &'static str) -> Result<T, E>
where
    T: TryFrom<u64>,
    F: FnMut(&str) -> Result<String, E>,
    E: From<Error>,
{
    let answer = ask(prompt)?;
    let value = answer.trim();

    let number = parse_number(key, value)?;
    T::try_from(number).map_err(|_| {
        E::from(Error::InvalidValue {
            key,
            value: String::from(value),
        })
    })
}

fn answer_name<F, E>(ask: &mut F, prompt: &str) -> Result<String, E>
where
    F: FnMut(&str) -> Result<String, E>,
{
    let mut answer = ask(prompt)?;
    let len = answer.trim_end_matches(['\r', '\n']).len();
    answer.truncate(len);

    Ok(answer)
}

impl Fmap {
    /// Ask for every field through `ask` and assemble the map.
    ///
    /// Values that do not fit their field are rejected rather than truncated.
    pub fn from_prompts<F, E>(mut ask: F) -> Result<Self, E>
    where
        F: FnMut(&str) -> Result<String, E>,
        E: From<Error>,
    {
        let base = answer_number(&mut ask, "binary base address", "fmap_base")?;
        let size = answer_number(&mut ask, "binary size", "fmap_size")?;
        let name = answer_name(&mut ask, "name of firmware image")?;
        let mut fmap = Fmap::create(base, size, name)?;

        let nareas: u16 = answer_number(&mut ask, "number of areas", "fmap_nareas")?;

        for i in 1..=nareas {
            let offset = answer_number(&mut ask, &format!("area {i} offset"), "area_offset")?;
            let size = answer_number(&mut ask, &format!("area {i} size"), "area_size")?;
            let name = answer_name(&mut ask, &format!("area {i} name"))?;
            let flags = answer_number(&mut ask, &format!("area {i} flags"), "area_flags_raw")?;

            fmap.append_area(offset, size, name, flags)?;
        }

        Ok(fmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_images::example_fmap;
    use alloc::{collections::VecDeque, string::ToString, vec::Vec};

    /// Answers from a script, recording the prompts seen.
    fn scripted<'a>(
        answers: &'a [&'a str],
        prompts: &'a mut Vec<String>,
    ) -> impl FnMut(&str) -> Result<String, Error> + 'a {
        let mut answers: VecDeque<&str> = answers.iter().copied().collect();

        move |prompt: &str| {
            prompts.push(prompt.to_string());
            answers
                .pop_front()
                .map(String::from)
                .ok_or(Error::MissingKey("answer"))
        }
    }

    #[test]
    fn test_prompt_example() -> Result<(), Error> {
        let answers = [
            "0\n", "1024\n", "example\n", "4\n", //
            "0\n", "128\n", "bootblock\n", "1\n", //
            "0x80\n", "0x80\n", "normal\n", "3\n", //
            "256\n", "256\n", "fallback\n", "0x3\n", //
            "512\n", "512\n", "data\r\n", "0\n",
        ];
        let mut prompts = Vec::new();

        let mut fmap = Fmap::from_prompts(scripted(&answers, &mut prompts))?;
        fmap.set_version_minor(0)?;
        assert_eq!(fmap, example_fmap()?);

        assert_eq!(prompts.len(), answers.len());
        assert_eq!(prompts[0], "binary base address");
        assert_eq!(prompts[3], "number of areas");
        assert_eq!(prompts[6], "area 1 name");
        assert_eq!(prompts[19], "area 4 flags");

        Ok(())
    }

    #[test]
    fn test_prompt_rejects_bad_answers() {
        let mut prompts = Vec::new();

        // size does not fit in 32 bits
        assert!(matches!(
            Fmap::from_prompts(scripted(&["0", "0x100000000"], &mut prompts)),
            Err(Error::InvalidValue { key: "fmap_size", .. })
        ));

        prompts.clear();
        assert!(matches!(
            Fmap::from_prompts(scripted(&["zero"], &mut prompts)),
            Err(Error::InvalidValue { key: "fmap_base", .. })
        ));

        // input ends before the last area is complete
        prompts.clear();
        assert_eq!(
            Fmap::from_prompts(scripted(&["0", "16", "img", "1", "0", "16"], &mut prompts)),
            Err(Error::MissingKey("answer"))
        );
        assert_eq!(prompts.last().map(String::as_str), Some("area 1 name"));

        prompts.clear();
        let unnamed = ["0", "16", "img", "1", "0", "16", "\n", "0"];
        assert_eq!(
            Fmap::from_prompts(scripted(&unnamed, &mut prompts)),
            Err(Error::EmptyName)
        );
    }
}
