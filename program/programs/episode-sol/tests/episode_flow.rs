use std::collections::{BTreeSet, HashMap};

use anchor_lang::prelude::*;
use episode_sol::errors::EpisodeError;
use episode_sol::state::*;

const LAMPORTS: u64 = 1_000_000_000;
const MAX_SUPPLY: u64 = 111;

const INTRO: &str = "Introduction: The Big Bang";
const BUILDERS: &str = "Chapter I: The Arch Builders";
const CHOSEN: &str = "Chapter II: The Chosen Ones";
const BELIEVERS: &str = "Chapter III: The Believers";
const BRAVE: &str = "Chapter IV: The Brave";
const WILD: &str = "Chapter V: The Wild Age";
const REVEAL: &str = "Chapter VI: The Great Reveal";
const CONCLUSION: &str = "Conclusion: Monuverse";

fn h(label: &str) -> Hash {
    hash_label(label)
}

fn key(seed: u8) -> Pubkey {
    Pubkey::new_from_array([seed; 32])
}

fn assert_error<T>(result: Result<T>, expected: EpisodeError) {
    match result {
        Ok(_) => panic!("expected {expected:?}"),
        Err(err) => assert_eq!(err, anchor_lang::error::Error::from(expected)),
    }
}

fn chapter(whitelisting: bool, limit: u64, price: u64, is_open: bool) -> ChapterConfig {
    ChapterConfig {
        whitelisting,
        minting: MintingConfig {
            limit,
            price,
            is_open,
        },
        revealing: false,
        is_conclusion: false,
    }
}

fn blank_episode() -> Episode {
    Episode {
        owner: Pubkey::default(),
        vrf_authority: Pubkey::default(),
        treasury: Pubkey::default(),
        name_hash: [0; 32],
        max_supply: 0,
        total_supply: 0,
        whitelist_root: [0; 32],
        reveal: Reveal::default(),
        bump: 0,
        automaton: Automaton::default(),
        chapters: Vec::new(),
        mint_groups: Vec::new(),
        veil_uri: String::new(),
        base_uri: String::new(),
    }
}

fn owner() -> Pubkey {
    key(200)
}

fn new_episode(max_supply: u64, initial: &str, config: ChapterConfig) -> Episode {
    let mut episode = blank_episode();
    episode
        .setup(
            owner(),
            key(201),
            key(202),
            h("Monuverse: Arch of Peace"),
            max_supply,
            h(initial),
            config,
            255,
        )
        .unwrap();
    episode
        .set_uris(
            Some("ipfs://veil".to_string()),
            Some("ipfs://base/".to_string()),
        )
        .unwrap();
    episode
}

/// The eight-chapter layout with its branching transitions.
fn monuverse() -> Episode {
    let price = 9 * LAMPORTS / 100;
    let mut episode = new_episode(MAX_SUPPLY, INTRO, chapter(true, 0, 0, false));
    episode.write_chapter(h(BUILDERS), chapter(true, 11, 0, false)).unwrap();
    episode.write_chapter(h(CHOSEN), chapter(false, MAX_SUPPLY, price, false)).unwrap();
    episode.write_chapter(h(BELIEVERS), chapter(false, MAX_SUPPLY, price, false)).unwrap();
    episode
        .write_chapter(h(BRAVE), chapter(false, MAX_SUPPLY, 11 * LAMPORTS / 100, true))
        .unwrap();
    episode.write_chapter(h(WILD), chapter(false, 0, 0, false)).unwrap();
    episode
        .write_chapter(
            h(REVEAL),
            ChapterConfig {
                revealing: true,
                ..Default::default()
            },
        )
        .unwrap();
    episode
        .write_chapter(
            h(CONCLUSION),
            ChapterConfig {
                is_conclusion: true,
                ..Default::default()
            },
        )
        .unwrap();

    let fixed = MintGroupRules {
        enabled: true,
        fixed_price: true,
    };
    let floating = MintGroupRules {
        enabled: true,
        fixed_price: false,
    };
    episode.write_mint_group(h(CHOSEN), h(BUILDERS), fixed).unwrap();
    episode.write_mint_group(h(BELIEVERS), h(BUILDERS), fixed).unwrap();
    episode.write_mint_group(h(BELIEVERS), h(CHOSEN), floating).unwrap();
    episode.write_mint_group(h(BRAVE), h(BUILDERS), fixed).unwrap();

    for (from, event, to) in [
        (INTRO, "EpisodeProgressedOnlife", BUILDERS),
        (BUILDERS, "EpisodeProgressedOnlife", CHOSEN),
        (CHOSEN, "EpisodeProgressedOnlife", BELIEVERS),
        (CHOSEN, "EpisodeMinted", WILD),
        (BELIEVERS, "EpisodeProgressedOnlife", BRAVE),
        (BELIEVERS, "EpisodeMinted", WILD),
        (BRAVE, "MintingSealed", WILD),
        (BRAVE, "EpisodeMinted", WILD),
        (WILD, "EpisodeProgressedOnlife", REVEAL),
        (REVEAL, "EpisodeRevealed", CONCLUSION),
    ] {
        episode.write_transition(&h(from), &h(to), h(event)).unwrap();
    }
    episode
}

fn progress(episode: &mut Episode) -> Step {
    episode
        .emit_onlife_event(&LifecycleEvent::ProgressedOnlife.hash())
        .unwrap()
        .expect("transition")
}

/// Sorted-pair Merkle tree; an odd node is carried up unchanged.
fn merkle(leaves: &[Hash]) -> (Hash, Vec<Vec<Hash>>) {
    let mut proofs = vec![Vec::new(); leaves.len()];
    let mut positions: Vec<usize> = (0..leaves.len()).collect();
    let mut level = leaves.to_vec();
    while level.len() > 1 {
        for (leaf, pos) in positions.iter_mut().enumerate() {
            let sibling = *pos ^ 1;
            if sibling < level.len() {
                proofs[leaf].push(level[sibling]);
            }
            *pos /= 2;
        }
        level = level
            .chunks(2)
            .map(|pair| match pair {
                [a, b] => hash_pair(a, b),
                [a] => *a,
                _ => unreachable!(),
            })
            .collect();
    }
    (level[0], proofs)
}

struct Allocation {
    account: Pubkey,
    limit: u64,
    group: &'static str,
}

fn publish(episode: &mut Episode, allocations: &[Allocation]) -> Vec<WhitelistClaim> {
    let leaves: Vec<Hash> = allocations
        .iter()
        .map(|a| leaf_hash(&a.account, a.limit, &h(a.group)))
        .collect();
    let (root, proofs) = merkle(&leaves);
    episode.set_whitelist_root(root).unwrap();
    allocations
        .iter()
        .zip(proofs)
        .map(|(a, proof)| WhitelistClaim {
            limit: a.limit,
            group: h(a.group),
            proof,
        })
        .collect()
}

/// Per-(minter, allowance, group) counters standing in for mint record accounts.
#[derive(Default)]
struct Records(HashMap<(Pubkey, Allowance, Hash), u64>);

impl Records {
    fn mint(
        &mut self,
        episode: &mut Episode,
        minter: &Pubkey,
        quantity: u64,
        offer: u64,
        claim: Option<&WhitelistClaim>,
    ) -> Result<(MintQuote, Option<CapacityReached>)> {
        let (allowance, group) = episode.mint_allowance(claim.map(|c| &c.group));
        let record = (*minter, allowance, *group);
        let minted = self.0.get(&record).copied().unwrap_or(0);
        let quote = episode.quote_mint(minter, quantity, offer, claim, minted)?;
        assert_eq!((quote.allowance, quote.group), (record.1, record.2));
        let reached = episode.apply_mint(&quote)?;
        *self.0.entry(record).or_default() += quote.quantity;
        Ok((quote, reached))
    }
}

fn whitelist() -> Vec<Allocation> {
    vec![
        Allocation {
            account: key(1),
            limit: 3,
            group: BUILDERS,
        },
        Allocation {
            account: key(2),
            limit: 1,
            group: BUILDERS,
        },
        Allocation {
            account: key(3),
            limit: 2,
            group: CHOSEN,
        },
        Allocation {
            account: key(4),
            limit: 2,
            group: CHOSEN,
        },
        Allocation {
            account: key(5),
            limit: 1,
            group: BELIEVERS,
        },
    ]
}

#[test]
fn configuration_freezes_after_progress() {
    let mut episode = monuverse();
    assert!(episode.in_configuration());
    assert_eq!(episode.chapters.len(), 8);
    assert_error(
        episode.write_transition(&h(INTRO), &h(WILD), LifecycleEvent::ProgressedOnlife.hash()),
        EpisodeError::DuplicateTransition,
    );

    let step = progress(&mut episode);
    assert_eq!(step, Step { from: h(INTRO), to: h(BUILDERS) });

    assert_error(
        episode.write_chapter(h("Epilogue"), ChapterConfig::default()),
        EpisodeError::UpdatesForbidden,
    );
    assert_error(
        episode.write_mint_group(h(BRAVE), h(CHOSEN), MintGroupRules::default()),
        EpisodeError::UpdatesForbidden,
    );
    assert_error(
        episode.write_transition(&h(WILD), &h(BRAVE), h("Rewind")),
        EpisodeError::UpdatesForbidden,
    );
    assert_error(episode.remove_chapter(&h(WILD)), EpisodeError::UpdatesForbidden);

    episode
        .remove_transition(&h(BRAVE), &LifecycleEvent::MintingSealed.hash())
        .unwrap();
    assert_eq!(
        episode
            .automaton
            .destination(&h(BRAVE), &LifecycleEvent::MintingSealed.hash()),
        None
    );
}

#[test]
fn chapter_writes_are_validated() {
    let mut episode = monuverse();
    assert_error(
        episode.write_chapter(
            h("Broken"),
            ChapterConfig {
                revealing: true,
                minting: MintingConfig {
                    limit: 1,
                    price: 0,
                    is_open: true,
                },
                ..Default::default()
            },
        ),
        EpisodeError::InvalidChapter,
    );
    assert_error(
        episode.write_chapter(h("Greedy"), chapter(false, MAX_SUPPLY + 1, 0, true)),
        EpisodeError::ChapterLimitExceedsSupply,
    );
    assert_error(
        episode.write_mint_group(h(BRAVE), h(WILD), MintGroupRules::default()),
        EpisodeError::InvalidMintGroup,
    );
    assert_error(
        episode.write_mint_group(h(BRAVE), h(BRAVE), MintGroupRules::default()),
        EpisodeError::InvalidMintGroup,
    );
    assert_error(
        episode.write_mint_group(h("Nowhere"), h(BUILDERS), MintGroupRules::default()),
        EpisodeError::ChapterNonExistent,
    );
    assert_error(episode.remove_chapter(&h(INTRO)), EpisodeError::InitialChapterRemoval);
    assert_error(
        episode.remove_mint_group(&h(BRAVE), &h(CHOSEN)),
        EpisodeError::MintGroupNonExistent,
    );
}

#[test]
fn removing_a_chapter_drops_its_rules_and_edges() {
    let mut episode = monuverse();
    episode.remove_chapter(&h(BUILDERS)).unwrap();

    assert!(episode.chapter(&h(BUILDERS)).is_none());
    assert!(episode.mint_groups.iter().all(|r| !r.references(&h(BUILDERS))));
    assert_eq!(episode.mint_groups.len(), 1);
    assert_eq!(
        episode
            .automaton
            .destination(&h(INTRO), &LifecycleEvent::ProgressedOnlife.hash()),
        None
    );
    assert_eq!(
        episode
            .automaton
            .destination(&h(CHOSEN), &LifecycleEvent::EpisodeMinted.hash()),
        Some(h(WILD))
    );
}

#[test]
fn rewriting_a_chapter_without_minting_drops_its_rules() {
    let mut episode = monuverse();
    episode.write_chapter(h(BUILDERS), chapter(true, 0, 0, false)).unwrap();
    assert!(episode.mint_groups.iter().all(|r| r.group != h(BUILDERS)));
    assert_eq!(episode.chapters.len(), 8);
}

#[test]
fn whitelist_mint_respects_allocation() {
    let mut episode = monuverse();
    let claims = publish(&mut episode, &whitelist());
    progress(&mut episode);
    let mut records = Records::default();

    let (quote, reached) = records
        .mint(&mut episode, &key(1), 3, 0, Some(&claims[0]))
        .unwrap();
    assert_eq!(quote.quantity, 3);
    assert_eq!(quote.cost, 0);
    assert!(reached.is_none());
    assert_eq!(episode.total_supply, 3);

    assert_error(
        records.mint(&mut episode, &key(1), 1, 0, Some(&claims[0])),
        EpisodeError::QuantityNotAllowed,
    );
    assert_error(
        records.mint(&mut episode, &key(9), 1, 0, Some(&claims[0])),
        EpisodeError::SenderNotWhitelisted,
    );
    assert_error(
        records.mint(&mut episode, &key(3), 1, 0, Some(&claims[2])),
        EpisodeError::GroupNotAllowed,
    );
    assert_error(
        records.mint(&mut episode, &key(1), 1, 0, None),
        EpisodeError::SenderNotWhitelisted,
    );
    assert_eq!(episode.total_supply, 3);
}

#[test]
fn whitelist_queries_are_private() {
    let mut episode = monuverse();
    let claims = publish(&mut episode, &whitelist());
    let claim = &claims[0];

    assert!(episode
        .is_account_whitelisted(&key(1), &key(1), claim.limit, &claim.group, &claim.proof)
        .unwrap());
    assert!(episode
        .is_account_whitelisted(&owner(), &key(1), claim.limit, &claim.group, &claim.proof)
        .unwrap());
    assert!(!episode
        .is_account_whitelisted(&key(1), &key(1), claim.limit + 1, &claim.group, &claim.proof)
        .unwrap());
    assert_error(
        episode.is_account_whitelisted(&key(2), &key(1), claim.limit, &claim.group, &claim.proof),
        EpisodeError::NotAllowedToCheckOthers,
    );
}

#[test]
fn whitelist_root_only_in_whitelisting_chapters() {
    let mut episode = monuverse();
    progress(&mut episode);
    episode.set_whitelist_root([1; 32]).unwrap();
    progress(&mut episode);
    assert_error(
        episode.set_whitelist_root([2; 32]),
        EpisodeError::WhitelistingNotAllowed,
    );
    assert_eq!(episode.whitelist_root, [1; 32]);
}

#[test]
fn cross_group_fixed_price() {
    let price = 9 * LAMPORTS / 100;
    let mut episode = monuverse();
    let claims = publish(&mut episode, &whitelist());
    progress(&mut episode);
    progress(&mut episode);
    assert_eq!(episode.current_chapter_id(), &h(CHOSEN));

    assert_eq!(episode.current_default_price().unwrap(), price);
    assert_eq!(episode.current_group_price(&h(BUILDERS)).unwrap(), 0);
    assert_eq!(episode.current_group_price(&h(CHOSEN)).unwrap(), price);
    assert_eq!(
        episode.group_rule(&h(BUILDERS)),
        Some(MintGroupRules {
            enabled: true,
            fixed_price: true,
        })
    );
    assert_eq!(episode.group_rule(&h(BELIEVERS)), None);

    let mut records = Records::default();
    let (quote, _) = records
        .mint(&mut episode, &key(1), 2, 0, Some(&claims[0]))
        .unwrap();
    assert_eq!(quote.price, 0);

    assert_error(
        records.mint(&mut episode, &key(3), 2, price, Some(&claims[2])),
        EpisodeError::OfferUnmatched,
    );
    let (quote, _) = records
        .mint(&mut episode, &key(3), 2, 2 * price, Some(&claims[2]))
        .unwrap();
    assert_eq!(quote.cost, 2 * price);

    assert_error(
        records.mint(&mut episode, &key(5), 1, price, Some(&claims[4])),
        EpisodeError::GroupNotAllowed,
    );
}

#[test]
fn floating_rule_uses_current_price() {
    let price = 9 * LAMPORTS / 100;
    let mut episode = monuverse();
    let claims = publish(&mut episode, &whitelist());
    for _ in 0..3 {
        progress(&mut episode);
    }
    assert_eq!(episode.current_chapter_id(), &h(BELIEVERS));
    assert_eq!(episode.current_group_price(&h(CHOSEN)).unwrap(), price);

    let mut records = Records::default();
    let (quote, _) = records
        .mint(&mut episode, &key(4), 1, price, Some(&claims[3]))
        .unwrap();
    assert_eq!(quote.group, h(CHOSEN));
    assert_eq!(quote.cost, price);
}

#[test]
fn exact_payment() {
    let mut episode = monuverse();
    for _ in 0..4 {
        progress(&mut episode);
    }
    let price = episode.current_default_price().unwrap();
    for quantity in 1..=3 {
        let exact = price * quantity;
        assert!(episode
            .offer_matches_group_price(&h(BRAVE), quantity, exact)
            .unwrap());
        assert!(!episode
            .offer_matches_group_price(&h(BRAVE), quantity, exact + 1)
            .unwrap());
        assert!(!episode
            .offer_matches_group_price(&h(BRAVE), quantity, exact - 1)
            .unwrap());
    }
    assert_error(
        episode.offer_matches_group_price(&h(BRAVE), u64::MAX, 0),
        EpisodeError::ArithmeticOverflow,
    );
}

#[test]
fn public_mint_in_open_chapter() {
    let mut episode = monuverse();
    let claims = publish(&mut episode, &whitelist());
    for _ in 0..4 {
        progress(&mut episode);
    }
    let price = episode.current_default_price().unwrap();
    let mut records = Records::default();

    assert_error(
        records.mint(&mut episode, &key(50), 0, 0, None),
        EpisodeError::QuantityNotAllowed,
    );
    records.mint(&mut episode, &key(50), 2, 2 * price, None).unwrap();
    records.mint(&mut episode, &key(50), 1, price, None).unwrap();
    assert_error(
        records.mint(&mut episode, &key(50), 1, price, None),
        EpisodeError::QuantityNotAllowed,
    );

    let (quote, _) = records
        .mint(&mut episode, &key(1), 1, 0, Some(&claims[0]))
        .unwrap();
    assert_eq!(quote.price, 0);
    assert_eq!(quote.allowance, Allowance::Whitelist);
    assert_eq!(episode.total_supply, 4);
}

#[test]
fn unadmitted_proof_mints_publicly_in_open_chapter() {
    let mut episode = monuverse();
    let claims = publish(&mut episode, &whitelist());
    for _ in 0..4 {
        progress(&mut episode);
    }
    assert_eq!(episode.current_chapter_id(), &h(BRAVE));
    let price = episode.current_default_price().unwrap();

    assert_eq!(
        episode.mint_allowance(Some(&h(CHOSEN))),
        (Allowance::Public, &h(BRAVE))
    );
    assert_eq!(
        episode.mint_allowance(Some(&h(BUILDERS))),
        (Allowance::Whitelist, &h(BUILDERS))
    );

    let mut records = Records::default();
    records.mint(&mut episode, &key(3), 2, 2 * price, None).unwrap();
    let (quote, _) = records
        .mint(&mut episode, &key(3), 1, price, Some(&claims[2]))
        .unwrap();
    assert_eq!(quote.allowance, Allowance::Public);
    assert_eq!(quote.group, h(BRAVE));
    assert_eq!(quote.cost, price);
    assert_error(
        records.mint(&mut episode, &key(3), 1, price, Some(&claims[2])),
        EpisodeError::QuantityNotAllowed,
    );

    let mut forged = claims[2].clone();
    forged.limit += 1;
    assert_error(
        records.mint(&mut episode, &key(3), 1, price, Some(&forged)),
        EpisodeError::SenderNotWhitelisted,
    );
}

#[test]
fn public_and_whitelist_allowances_are_counted_apart() {
    let mut episode = new_episode(20, "Drop", chapter(true, 0, 0, false));
    episode.write_chapter(h("Sale"), chapter(true, 20, 1_000, true)).unwrap();
    episode
        .write_transition(&h("Drop"), &h("Sale"), LifecycleEvent::ProgressedOnlife.hash())
        .unwrap();
    let claims = publish(
        &mut episode,
        &[
            Allocation {
                account: key(1),
                limit: 5,
                group: "Sale",
            },
            Allocation {
                account: key(2),
                limit: 1,
                group: "Sale",
            },
        ],
    );
    progress(&mut episode);

    let mut records = Records::default();
    let (quote, _) = records.mint(&mut episode, &key(1), 3, 3_000, None).unwrap();
    assert_eq!(quote.allowance, Allowance::Public);
    assert_error(
        records.mint(&mut episode, &key(1), 1, 1_000, None),
        EpisodeError::QuantityNotAllowed,
    );

    let (quote, _) = records
        .mint(&mut episode, &key(1), 3, 3_000, Some(&claims[0]))
        .unwrap();
    assert_eq!(quote.allowance, Allowance::Whitelist);
    assert_eq!(quote.group, h("Sale"));
    assert_error(
        records.mint(&mut episode, &key(1), 3, 3_000, Some(&claims[0])),
        EpisodeError::QuantityNotAllowed,
    );
    records
        .mint(&mut episode, &key(1), 2, 2_000, Some(&claims[0]))
        .unwrap();
    assert_eq!(episode.total_supply, 8);

    let episode_key = key(77);
    let record = |allowance: Allowance| {
        Pubkey::find_program_address(
            &[
                MintRecord::SEED_PREFIX,
                episode_key.as_ref(),
                key(1).as_ref(),
                allowance.seed(),
                h("Sale").as_ref(),
            ],
            &episode_sol::ID,
        )
        .0
    };
    assert_ne!(record(Allowance::Public), record(Allowance::Whitelist));
}

#[test]
fn no_mint_outside_minting_chapters() {
    let mut episode = monuverse();
    let mut records = Records::default();
    assert_error(
        records.mint(&mut episode, &key(1), 1, 0, None),
        EpisodeError::NoMintChapter,
    );
    assert_error(episode.current_default_price(), EpisodeError::NoMintChapter);
    assert_error(episode.seal_minting(), EpisodeError::NoMintChapter);
}

#[test]
fn capacity_triggered_transition() {
    let open = chapter(false, 100, 1_000, true);
    let mut episode = new_episode(100, "Drop", chapter(false, 0, 0, false));
    episode.write_chapter(h("Sale"), open).unwrap();
    episode.write_chapter(h("After"), ChapterConfig::default()).unwrap();
    episode
        .write_transition(&h("Drop"), &h("Sale"), LifecycleEvent::ProgressedOnlife.hash())
        .unwrap();
    episode
        .write_transition(&h("Sale"), &h("After"), LifecycleEvent::EpisodeMinted.hash())
        .unwrap();
    progress(&mut episode);

    let mut records = Records::default();
    for minter in 0..33u8 {
        let (_, reached) = records
            .mint(&mut episode, &key(minter), 3, 3_000, None)
            .unwrap();
        assert!(reached.is_none());
    }
    assert_eq!(episode.total_supply, 99);
    assert_eq!(episode.current_chapter_id(), &h("Sale"));

    let (quote, reached) = records
        .mint(&mut episode, &key(100), 3, 3_000, None)
        .unwrap();
    assert_eq!(quote.quantity, 1);
    assert_eq!(quote.cost, 1_000);
    assert_eq!(
        reached,
        Some(CapacityReached {
            event: LifecycleEvent::EpisodeMinted,
            step: Some(Step {
                from: h("Sale"),
                to: h("After"),
            }),
        })
    );
    assert_eq!(episode.total_supply, 100);
    assert_eq!(episode.current_chapter_id(), &h("After"));
}

#[test]
fn filled_chapter_without_edge_stays_minted_out() {
    let mut episode = monuverse();
    let mut allocations = whitelist();
    allocations[0].limit = 11;
    let claims = publish(&mut episode, &allocations);
    progress(&mut episode);

    let mut records = Records::default();
    let (quote, reached) = records
        .mint(&mut episode, &key(1), 11, 0, Some(&claims[0]))
        .unwrap();
    assert_eq!(quote.quantity, 11);
    assert_eq!(
        reached,
        Some(CapacityReached {
            event: LifecycleEvent::ChapterMinted,
            step: None,
        })
    );
    assert_eq!(episode.current_chapter_id(), &h(BUILDERS));
    assert_error(
        records.mint(&mut episode, &key(2), 1, 0, Some(&claims[1])),
        EpisodeError::ChapterMintedOut,
    );
    assert_error(episode.seal_minting(), EpisodeError::SealingNotAllowed);
}

#[test]
fn sealing_ends_an_open_chapter() {
    let mut episode = monuverse();
    for _ in 0..4 {
        progress(&mut episode);
    }
    let step = episode.seal_minting().unwrap();
    assert_eq!(step, Some(Step { from: h(BRAVE), to: h(WILD) }));
    assert_error(episode.seal_minting(), EpisodeError::NoMintChapter);
}

#[test]
fn onlife_event_policy() {
    let mut episode = monuverse();
    assert_error(
        episode.emit_onlife_event(&h("NeverWired")),
        EpisodeError::EventNonExistent,
    );
    assert_error(
        episode.emit_onlife_event(&LifecycleEvent::MintingSealed.hash()),
        EpisodeError::ReservedEvent,
    );

    for _ in 0..4 {
        progress(&mut episode);
    }
    assert_eq!(episode.current_chapter_id(), &h(BRAVE));
    // Brave only leaves through sealing or selling out.
    assert_eq!(
        episode
            .emit_onlife_event(&LifecycleEvent::ProgressedOnlife.hash())
            .unwrap(),
        None
    );
    assert_eq!(episode.current_chapter_id(), &h(BRAVE));

    episode.seal_minting().unwrap();
    progress(&mut episode);
    assert_eq!(episode.current_chapter_id(), &h(REVEAL));
    assert_eq!(
        episode
            .emit_onlife_event(&LifecycleEvent::ProgressedOnlife.hash())
            .unwrap(),
        None
    );
    assert_eq!(episode.current_chapter_id(), &h(REVEAL));
}

#[test]
fn custom_onlife_events() {
    let mut episode = new_episode(10, "Start", ChapterConfig::default());
    episode
        .write_chapter(
            h("End"),
            ChapterConfig {
                is_conclusion: true,
                ..Default::default()
            },
        )
        .unwrap();
    episode.write_transition(&h("Start"), &h("End"), h("Curtain")).unwrap();

    assert!(!episode.is_final());
    let step = episode.emit_onlife_event(&h("Curtain")).unwrap();
    assert_eq!(step, Some(Step { from: h("Start"), to: h("End") }));
    assert!(episode.is_final());
}

#[test]
fn reveal_single_use() {
    let mut episode = monuverse();
    let episode_key = key(77);
    for _ in 0..4 {
        progress(&mut episode);
    }
    let price = episode.current_default_price().unwrap();
    let mut records = Records::default();
    for minter in 0..5u8 {
        records
            .mint(&mut episode, &key(minter + 100), 3, 3 * price, None)
            .unwrap();
    }
    let supply = episode.total_supply;
    assert_eq!(supply, 15);

    assert_error(episode.request_reveal(&episode_key, 10), EpisodeError::RevealNotAllowed);
    episode.seal_minting().unwrap();
    progress(&mut episode);
    assert_eq!(episode.current_chapter_id(), &h(REVEAL));

    for token_id in 0..supply {
        assert_eq!(episode.token_uri(token_id).unwrap(), "ipfs://veil");
    }
    assert_error(episode.token_uri(supply), EpisodeError::NonExistentToken);

    assert_eq!(episode.request_reveal(&episode_key, 10).unwrap(), 1);
    assert_eq!(episode.reveal.requested_id(), Some(1));
    assert_error(
        episode.request_reveal(&episode_key, 11),
        EpisodeError::CurrentlyFulfilling,
    );
    assert_error(
        episode.fulfill_reveal(2, [42; 32]),
        EpisodeError::RequestIdMismatch,
    );

    let step = episode.fulfill_reveal(1, [42; 32]).unwrap();
    assert_eq!(step, Some(Step { from: h(REVEAL), to: h(CONCLUSION) }));
    assert!(episode.is_final());

    let ids: BTreeSet<u64> = (0..supply)
        .map(|token_id| {
            let uri = episode.token_uri(token_id).unwrap();
            let suffix = uri.strip_prefix("ipfs://base/").expect("base uri prefix");
            suffix.parse::<u64>().unwrap()
        })
        .collect();
    assert_eq!(ids, (0..supply).collect::<BTreeSet<u64>>());
}

#[test]
fn no_minting_after_reveal() {
    let mut episode = new_episode(10, "Start", chapter(false, 0, 0, false));
    episode
        .write_chapter(
            h("Reveal"),
            ChapterConfig {
                revealing: true,
                ..Default::default()
            },
        )
        .unwrap();
    episode.write_chapter(h("Sale"), chapter(false, 10, 0, true)).unwrap();
    episode
        .write_transition(&h("Start"), &h("Reveal"), LifecycleEvent::ProgressedOnlife.hash())
        .unwrap();
    episode
        .write_transition(&h("Reveal"), &h("Sale"), LifecycleEvent::EpisodeRevealed.hash())
        .unwrap();
    progress(&mut episode);

    episode.request_reveal(&key(7), 1).unwrap();
    episode.fulfill_reveal(1, [3; 32]).unwrap();
    assert_eq!(episode.current_chapter_id(), &h("Sale"));

    let mut records = Records::default();
    assert_error(
        records.mint(&mut episode, &key(1), 1, 0, None),
        EpisodeError::AlreadyRevealed,
    );
}

#[test]
fn setup_rejects_bad_parameters() {
    let mut episode = blank_episode();
    assert_error(
        episode.setup(owner(), key(1), key(2), [1; 32], 0, h("A"), ChapterConfig::default(), 0),
        EpisodeError::InvalidMaxSupply,
    );
    assert_error(
        episode.setup(
            owner(),
            Pubkey::default(),
            key(2),
            [1; 32],
            10,
            h("A"),
            ChapterConfig::default(),
            0,
        ),
        EpisodeError::ZeroAddressNotAllowed,
    );
    let mut episode = new_episode(10, "A", ChapterConfig::default());
    assert_error(
        episode.set_uris(Some("x".repeat(MAX_URI_LEN + 1)), None),
        EpisodeError::UriTooLong,
    );
}

#[test]
fn account_space_counts_hash_fields() {
    assert_eq!(StateNode::INIT_SPACE, 32 + 1);
    assert_eq!(Chapter::INIT_SPACE, 32 + (1 + (8 + 8 + 1) + 1 + 1));
    assert_eq!(MintGroupRule::INIT_SPACE, 32 + 32 + 2);
    assert_eq!(Reveal::INIT_SPACE, 1 + 8 * 3 + 32 * 2);
    assert_eq!(MintRecord::INIT_SPACE, 32 + 32 + 1 + 32 + 8 + 1);
    assert_eq!(
        Automaton::INIT_SPACE,
        (4 + MAX_STATES * 33) + (4 + MAX_SYMBOLS * 32) + (4 + MAX_EDGES * 3) + 2
    );
}
