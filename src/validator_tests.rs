// Validator Tests

#[cfg(test)]
mod validator_tests {
    use crate::asset::AssetCheck;
    use crate::diagnostics::{DiagnosticCategory, Severity};
    use crate::ir::*;
    use crate::model::*;
    use crate::validator::validate;

    /// A model that passes every check: one sprite-less entity in one scene.
    fn clean_model() -> Model {
        let mut model = Model::new("test");
        model.entities.push(Entity::new("player"));
        model
            .scenes
            .push(Scene::new("main").with_entities(&["player"]));
        model
    }

    fn errors_of(model: &Model, category: DiagnosticCategory) -> Vec<String> {
        validate(model)
            .of_category(category)
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.message.clone())
            .collect()
    }

    fn warnings_of(model: &Model, category: DiagnosticCategory) -> Vec<String> {
        validate(model)
            .of_category(category)
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| d.message.clone())
            .collect()
    }

    #[test]
    fn clean_model_is_valid() {
        let result = validate(&clean_model());
        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    // --- Resource budgets ---------------------------------------------

    fn model_with_oam_usage(slots: usize) -> Model {
        let mut model = clean_model();
        model.sprites.push(Sprite::new("dot", 8, 8));
        model
            .pools
            .push(Pool::new("bullet", slots).with_sprite("dot"));
        model
    }

    #[test]
    fn oam_over_limit_is_an_error() {
        let messages = errors_of(&model_with_oam_usage(65), DiagnosticCategory::ResourceBudget);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("object slot budget exceeded: 65 used, hardware limit is 64"),
            "{}",
            messages[0]
        );
    }

    #[test]
    fn oam_exactly_at_limit_is_a_warning_not_an_error() {
        let model = model_with_oam_usage(64);
        let result = validate(&model);
        assert!(result.is_valid(), "{:?}", result.errors);
        let messages = warnings_of(&model, DiagnosticCategory::ResourceBudget);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("at the hardware limit"),
            "{}",
            messages[0]
        );
    }

    #[test]
    fn oam_near_limit_is_a_high_usage_warning() {
        let messages =
            warnings_of(&model_with_oam_usage(50), DiagnosticCategory::ResourceBudget);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("usage is high"), "{}", messages[0]);
    }

    #[test]
    fn logic_only_pools_cost_no_object_slots() {
        let mut model = clean_model();
        model.pools.push(Pool::new("timers", 100));
        let result = validate(&model);
        assert!(result
            .of_category(DiagnosticCategory::ResourceBudget)
            .is_empty());
    }

    #[test]
    fn wram_budget_counts_nav_grids() {
        let mut model = clean_model();
        model.nav_grids.push(NavGrid::new("world", 50, 50)); // 2500 cells
        let messages = errors_of(&model, DiagnosticCategory::ResourceBudget);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("working-memory byte budget exceeded"),
            "{}",
            messages[0]
        );
    }

    #[test]
    fn vram_budget_counts_animation_frames() {
        // 64x64 sprite = 64 tiles; 1 base frame + 4 animation frames = 320.
        let mut model = clean_model();
        model
            .animations
            .push(Animation::new("spin", vec![0, 1, 2, 3]));
        model
            .sprites
            .push(Sprite::new("boss", 64, 64).with_animations(&["spin"]));
        let messages = errors_of(&model, DiagnosticCategory::ResourceBudget);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("video-memory tile budget exceeded: 320 used"),
            "{}",
            messages[0]
        );
    }

    // --- State machines -----------------------------------------------

    #[test]
    fn empty_state_machine_is_an_error() {
        let mut model = clean_model();
        model
            .state_machines
            .push(StateMachine::new("boss_brain", vec![]));
        let messages = errors_of(&model, DiagnosticCategory::StateMachine);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("'boss_brain' has no states"));
    }

    #[test]
    fn dangling_transition_gets_a_suggestion() {
        let mut model = clean_model();
        let cond = Expr::literal(1, NumType::U8);
        model.state_machines.push(StateMachine::new(
            "brain",
            vec![
                State::new("idle").with_transition(cond, "atack"),
                State::new("attack"),
            ],
        ));
        let result = validate(&model);
        let findings = result.of_category(DiagnosticCategory::StateMachine);
        let dangling = findings
            .iter()
            .find(|d| d.message.contains("undeclared state 'atack'"))
            .expect("dangling transition not reported");
        assert_eq!(
            dangling.suggestion.as_deref(),
            Some("did you mean 'attack'?")
        );
    }

    #[test]
    fn unreachable_state_is_a_warning_naming_the_state() {
        let mut model = clean_model();
        let cond = Expr::literal(1, NumType::U8);
        model.state_machines.push(StateMachine::new(
            "brain",
            vec![
                State::new("idle").with_transition(cond.clone(), "attack"),
                State::new("attack").with_transition(cond, "idle"),
                State::new("stunned"),
            ],
        ));
        let result = validate(&model);
        assert!(result.is_valid(), "{:?}", result.errors);
        let messages = warnings_of(&model, DiagnosticCategory::StateMachine);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("state 'stunned' is unreachable from start state 'idle'"),
            "{}",
            messages[0]
        );
    }

    #[test]
    fn cycles_do_not_hang_reachability() {
        let mut model = clean_model();
        let cond = Expr::literal(1, NumType::U8);
        model.state_machines.push(StateMachine::new(
            "brain",
            vec![
                State::new("a").with_transition(cond.clone(), "b"),
                State::new("b").with_transition(cond, "a"),
            ],
        ));
        assert!(validate(&model).is_valid());
    }

    // --- Duplicate names ----------------------------------------------

    #[test]
    fn duplicate_names_are_reported_once_per_name() {
        let mut model = clean_model();
        model.variables.push(Symbol::new("score", NumType::U16));
        model.variables.push(Symbol::new("score", NumType::U8));
        model.variables.push(Symbol::new("score", NumType::U8));
        let messages = errors_of(&model, DiagnosticCategory::DuplicateName);
        assert_eq!(messages, vec!["duplicate variable name 'score'"]);
    }

    #[test]
    fn field_namespaces_are_independent_of_globals() {
        let mut model = clean_model();
        model.variables.push(Symbol::new("hp", NumType::U8));
        model.entities[0].fields.push(Symbol::new("hp", NumType::U8));
        model
            .pools
            .push(Pool::new("orbs", 4).with_field(Symbol::new("hp", NumType::U8)));
        assert!(validate(&model).is_valid());
    }

    #[test]
    fn duplicate_pool_field_is_an_error() {
        let mut model = clean_model();
        model.pools.push(
            Pool::new("orbs", 4)
                .with_field(Symbol::new("vel", NumType::I8))
                .with_field(Symbol::new("vel", NumType::I8)),
        );
        let messages = errors_of(&model, DiagnosticCategory::DuplicateName);
        assert_eq!(messages, vec!["duplicate pool 'orbs' field name 'vel'"]);
    }

    // --- References ----------------------------------------------------

    #[test]
    fn scene_goto_to_unknown_scene_suggests_the_close_name() {
        let mut model = clean_model();
        model.entities[0].on_frame = vec![Stmt::scene_goto("mian")];
        let result = validate(&model);
        let findings = result.of_category(DiagnosticCategory::SceneReference);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("unknown scene 'mian'"));
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("did you mean 'main'?")
        );
    }

    #[test]
    fn entity_with_unknown_sprite_is_an_error() {
        let mut model = clean_model();
        model.sprites.push(Sprite::new("player_ship", 16, 16));
        model.entities[0].sprite = Some("player_shp".to_string());
        let result = validate(&model);
        let findings = result.of_category(DiagnosticCategory::SpriteReference);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("did you mean 'player_ship'?")
        );
    }

    #[test]
    fn anim_play_checks_both_names() {
        let mut model = clean_model();
        model.entities[0].on_frame = vec![Stmt::anim_play("ghost", "walk")];
        let result = validate(&model);
        assert_eq!(
            result.of_category(DiagnosticCategory::SpriteReference).len(),
            1
        );
        assert_eq!(
            result
                .of_category(DiagnosticCategory::AnimationReference)
                .len(),
            1
        );
    }

    #[test]
    fn scene_membership_is_checked() {
        let mut model = clean_model();
        model.scenes[0].pools.push("bulets".to_string());
        model.pools.push(Pool::new("bullets", 8));
        let result = validate(&model);
        let findings = result.of_category(DiagnosticCategory::SceneReference);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("did you mean 'bullets'?")
        );
    }

    // --- Array bounds ---------------------------------------------------

    fn model_with_pool_access(index: i32) -> Model {
        let mut model = clean_model();
        model
            .pools
            .push(Pool::new("bullet", 8).with_field(Symbol::new("vel", NumType::I8)));
        model.entities[0].on_frame = vec![Stmt::assign(
            AssignTarget::Var("x".to_string()),
            AssignOp::Set,
            Expr::index(
                "bullet.vel",
                Expr::literal(index, NumType::U8),
                NumType::I8,
            ),
        )];
        model
    }

    #[test]
    fn literal_index_at_capacity_is_an_error() {
        let messages =
            errors_of(&model_with_pool_access(8), DiagnosticCategory::ArrayBounds);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("indexes 'bullet.vel' at 8, outside capacity 8"),
            "{}",
            messages[0]
        );
    }

    #[test]
    fn literal_index_below_capacity_is_fine() {
        assert!(validate(&model_with_pool_access(7)).is_valid());
    }

    #[test]
    fn unknown_pool_and_field_are_both_reported() {
        let mut model = clean_model();
        model.pools.push(Pool::new("bullet", 8));
        model.entities[0].on_frame = vec![Stmt::assign(
            AssignTarget::Index {
                array: "rocket.vel".to_string(),
                index: Expr::literal(0, NumType::U8),
            },
            AssignOp::Set,
            Expr::index("bullet.vel", Expr::literal(0, NumType::U8), NumType::I8),
        )];
        let messages = errors_of(&model, DiagnosticCategory::ArrayBounds);
        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .any(|m| m.contains("unknown field 'vel' of pool 'bullet'")));
        assert!(messages
            .iter()
            .any(|m| m.contains("unknown pool 'rocket'")));
    }

    #[test]
    fn dynamic_indexes_are_not_bounds_checked() {
        let mut model = clean_model();
        model
            .pools
            .push(Pool::new("bullet", 8).with_field(Symbol::new("vel", NumType::I8)));
        model.entities[0].on_frame = vec![Stmt::assign(
            AssignTarget::Var("x".to_string()),
            AssignOp::Set,
            Expr::index(
                "bullet.vel",
                Expr::var("cursor", NumType::U8),
                NumType::I8,
            ),
        )];
        assert!(validate(&model).is_valid());
    }

    #[test]
    fn despawn_conditions_are_bounds_checked() {
        let mut model = clean_model();
        model.pools.push(
            Pool::new("bullet", 8)
                .with_field(Symbol::new("vel", NumType::I8))
                .with_despawn_when(Expr::compare(
                    CompareOp::Gt,
                    Expr::index("bullet.vel", Expr::literal(99, NumType::U8), NumType::I8),
                    Expr::literal(0, NumType::I8),
                )),
        );
        let messages = errors_of(&model, DiagnosticCategory::ArrayBounds);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("pool 'bullet' despawn_when"),
            "{}",
            messages[0]
        );
        assert!(
            messages[0].contains("indexes 'bullet.vel' at 99, outside capacity 8"),
            "{}",
            messages[0]
        );
    }

    #[test]
    fn transition_conditions_are_bounds_checked() {
        let mut model = clean_model();
        model
            .pools
            .push(Pool::new("bullet", 8).with_field(Symbol::new("vel", NumType::I8)));
        model.state_machines.push(StateMachine::new(
            "brain",
            vec![State::new("idle").with_transition(
                Expr::compare(
                    CompareOp::Eq,
                    Expr::index("bullet.vel", Expr::literal(50, NumType::U8), NumType::I8),
                    Expr::literal(0, NumType::I8),
                ),
                "idle",
            )],
        ));
        let messages = errors_of(&model, DiagnosticCategory::ArrayBounds);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("machine 'brain' state 'idle' transition to 'idle'"),
            "{}",
            messages[0]
        );
        assert!(
            messages[0].contains("indexes 'bullet.vel' at 50, outside capacity 8"),
            "{}",
            messages[0]
        );
    }

    // --- Tweens ----------------------------------------------------------

    #[test]
    fn zero_duration_tween_is_an_error() {
        let mut model = clean_model();
        model.entities[0].on_frame = vec![Stmt::tween(
            AssignTarget::Var("x".to_string()),
            10,
            0,
            Easing::Linear,
        )];
        let messages = errors_of(&model, DiagnosticCategory::TweenRange);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("zero duration"));
    }

    #[test]
    fn very_long_tween_is_a_warning() {
        let mut model = clean_model();
        model.entities[0].on_frame = vec![Stmt::tween(
            AssignTarget::Var("x".to_string()),
            10,
            1200,
            Easing::EaseOut,
        )];
        let result = validate(&model);
        assert!(result.is_valid());
        let messages = warnings_of(&model, DiagnosticCategory::TweenRange);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("unusually long tween (1200 frames)"));
    }

    #[test]
    fn tween_target_outside_its_type_range_is_an_error() {
        let mut model = clean_model();
        model.variables.push(Symbol::new("hp", NumType::U8));
        model.entities[0].on_frame = vec![Stmt::tween(
            AssignTarget::Var("hp".to_string()),
            300,
            60,
            Easing::Linear,
        )];
        let messages = errors_of(&model, DiagnosticCategory::TweenRange);
        assert_eq!(messages.len(), 1);
        assert!(
            messages[0].contains("tweens 'hp' to 300, outside its byte range 0..=255"),
            "{}",
            messages[0]
        );
    }

    // --- Physics ----------------------------------------------------------

    #[test]
    fn non_positive_mass_is_an_error() {
        let mut model = clean_model();
        model.entities[0].physics = Some(Physics {
            gravity: 2,
            friction: 16,
            mass: 0,
        });
        let messages = errors_of(&model, DiagnosticCategory::PhysicsRange);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("non-positive mass 0"));
    }

    #[test]
    fn extreme_gravity_and_friction_are_warnings() {
        let mut model = clean_model();
        model.entities[0].physics = Some(Physics {
            gravity: -100,
            friction: 300,
            mass: 1,
        });
        let result = validate(&model);
        assert!(result.is_valid());
        let messages = warnings_of(&model, DiagnosticCategory::PhysicsRange);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.contains("extreme gravity -100")));
        assert!(messages
            .iter()
            .any(|m| m.contains("friction 300 outside 0..=255")));
    }

    // --- Palettes -----------------------------------------------------------

    #[test]
    fn too_many_palettes_of_one_kind_is_an_error() {
        let mut model = clean_model();
        for i in 0..5 {
            model.palettes.push(Palette::new(
                &format!("bg{}", i),
                PaletteKind::Background,
                vec![1, 2, 3],
            ));
        }
        let messages = errors_of(&model, DiagnosticCategory::PaletteLimit);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("5 background palettes declared, hardware has 4 slots"));
    }

    #[test]
    fn kinds_have_separate_slot_spaces() {
        let mut model = clean_model();
        for i in 0..4 {
            model.palettes.push(
                Palette::new(&format!("bg{}", i), PaletteKind::Background, vec![1])
                    .with_slot(i),
            );
            model.palettes.push(
                Palette::new(&format!("sp{}", i), PaletteKind::Sprite, vec![1]).with_slot(i),
            );
        }
        assert!(validate(&model).is_valid());
    }

    #[test]
    fn slot_collisions_and_out_of_range_slots_are_errors() {
        let mut model = clean_model();
        model.palettes.push(
            Palette::new("grass", PaletteKind::Background, vec![1]).with_slot(2),
        );
        model.palettes.push(
            Palette::new("dirt", PaletteKind::Background, vec![2]).with_slot(2),
        );
        model
            .palettes
            .push(Palette::new("sky", PaletteKind::Background, vec![3]).with_slot(4));
        let messages = errors_of(&model, DiagnosticCategory::PaletteLimit);
        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .any(|m| m.contains("'dirt' claims background slot 2, already claimed by 'grass'")));
        assert!(messages
            .iter()
            .any(|m| m.contains("'sky' claims slot 4, valid background slots are 0..=3")));
    }

    #[test]
    fn palette_with_too_many_colors_is_an_error() {
        let mut model = clean_model();
        model.palettes.push(Palette::new(
            "rainbow",
            PaletteKind::Sprite,
            vec![1, 2, 3, 4],
        ));
        let messages = errors_of(&model, DiagnosticCategory::PaletteLimit);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("'rainbow' has 4 colors, hardware allows 3"));
    }

    #[test]
    fn sprite_palette_reference_is_checked() {
        let mut model = clean_model();
        model
            .palettes
            .push(Palette::new("hero_colors", PaletteKind::Sprite, vec![1, 2]));
        model
            .sprites
            .push(Sprite::new("hero", 16, 16).with_palette("hero_color"));
        let result = validate(&model);
        let findings = result.of_category(DiagnosticCategory::PaletteLimit);
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].suggestion.as_deref(),
            Some("did you mean 'hero_colors'?")
        );
    }

    // --- Assets -------------------------------------------------------------

    #[test]
    fn rejected_asset_surfaces_each_reason_as_an_error() {
        let mut model = clean_model();
        let asset = AssetCheck {
            valid: false,
            errors: vec!["bad signature".to_string(), "width 0 invalid".to_string()],
            width: 0,
            height: 0,
        };
        model
            .sprites
            .push(Sprite::new("hero", 16, 16).with_asset(asset));
        let messages = errors_of(&model, DiagnosticCategory::AssetFormat);
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("sprite 'hero' asset rejected: bad signature"));
    }

    #[test]
    fn dimension_mismatch_is_a_warning() {
        let mut model = clean_model();
        let asset = AssetCheck {
            valid: true,
            errors: vec![],
            width: 32,
            height: 32,
        };
        model
            .sprites
            .push(Sprite::new("hero", 16, 16).with_asset(asset));
        let result = validate(&model);
        assert!(result.is_valid());
        let messages = warnings_of(&model, DiagnosticCategory::AssetFormat);
        assert_eq!(messages.len(), 1);
        assert!(messages[0].contains("declared 16x16 but its asset is 32x32"));
    }
}
